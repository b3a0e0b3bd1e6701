//! Offline integration tests: the whole pipeline against a scripted
//! completion client and a fake OCR backend. No network, no API keys.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use traduja::context::{AFTER_PREAMBLE, BEFORE_PREAMBLE};
use traduja::prompts::LINE_SENTINEL;
use traduja::{
    translate_markdown_with, translate_pdf_with, write_outputs, CompletionClient, FnCallbacks,
    LineTranslator, ModelPricing, OcrExtractor, PageSeparator, TokenAccountant, TokenEncoder,
    TokenLedger, TokenizerError, TranslateError, TranslationConfig, TranslationProgressCallback,
};

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Replies from a fixed table (falling back to `"<line>!"`) and records every
/// request.
#[derive(Default)]
struct ScriptedClient {
    replies: HashMap<String, String>,
    requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    fn with(pairs: &[(&str, &str)]) -> Self {
        Self {
            replies: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, TranslateError> {
        self.requests
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        Ok(self
            .replies
            .get(user)
            .cloned()
            .unwrap_or_else(|| format!("{user}!")))
    }
}

/// Fails every request after the first `ok` ones.
struct FlakyClient {
    ok: usize,
    seen: Mutex<usize>,
}

#[async_trait]
impl CompletionClient for FlakyClient {
    async fn complete(&self, _: &str, user: &str) -> Result<String, TranslateError> {
        let mut seen = self.seen.lock().unwrap();
        *seen += 1;
        if *seen > self.ok {
            return Err(TranslateError::LlmApiError {
                line: 0,
                message: "429 Too Many Requests".into(),
            });
        }
        Ok(user.to_uppercase())
    }
}

struct FakeOcr(Vec<&'static str>);

#[async_trait]
impl OcrExtractor for FakeOcr {
    async fn extract_pages(&self, _path: &Path) -> Result<Vec<String>, TranslateError> {
        Ok(self.0.iter().map(|s| s.to_string()).collect())
    }
}

struct BrokenTokenizer;

impl TokenEncoder for BrokenTokenizer {
    fn count(&self, _text: &str) -> Result<usize, TokenizerError> {
        Err(TokenizerError::EncodeFailed("vocabulary missing".into()))
    }
}

/// Records every callback in order.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    ledgers: Mutex<Vec<TokenLedger>>,
}

impl TranslationProgressCallback for Recorder {
    fn on_translation_start(&self, total_lines: usize) {
        self.events.lock().unwrap().push(format!("start {total_lines}"));
    }
    fn on_line_complete(&self, done: usize, total: usize) {
        self.events.lock().unwrap().push(format!("line {done}/{total}"));
    }
    fn on_token_update(&self, ledger: &TokenLedger) {
        self.events.lock().unwrap().push("tokens".into());
        self.ledgers.lock().unwrap().push(*ledger);
    }
    fn on_translation_complete(&self, total_lines: usize, model_calls: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete {total_lines} {model_calls}"));
    }
}

/// Route library logs to the test harness; `RUST_LOG=traduja=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn approx() -> TokenAccountant {
    TokenAccountant::approximate(ModelPricing::GPT_4O_MINI)
}

fn write_pdf(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("paper.pdf");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"%PDF-1.4\n%fake\n").unwrap();
    path.to_string_lossy().into_owned()
}

// ── Driver scenarios ─────────────────────────────────────────────────────────

#[tokio::test]
async fn hello_blank_world_to_portuguese() {
    let client = ScriptedClient::with(&[("Hello", "Olá"), ("World", "Mundo")]);
    let translator = LineTranslator::new(&client, approx(), "en", "pt");

    let out = translator.translate("Hello\n\nWorld", None).await.unwrap();
    assert_eq!(out.text, "Olá\n\nMundo");
    assert_eq!(out.total_lines, 3);
    assert_eq!(out.model_calls, 2);

    let reqs = client.requests();
    assert_eq!(reqs.len(), 2);

    // Line 0: no before-context, after-context is the raw "World".
    assert!(reqs[0].0.contains("from English to Portuguese"));
    assert!(!reqs[0].0.contains(BEFORE_PREAMBLE));
    assert!(reqs[0].0.contains(&format!("{AFTER_PREAMBLE}\nWorld")));
    assert!(reqs[0].0.ends_with(LINE_SENTINEL));
    assert_eq!(reqs[0].1, "Hello");

    // Line 2: before-context holds line 0's translation, no after-context.
    assert!(reqs[1].0.contains(&format!("{BEFORE_PREAMBLE}\nOlá")));
    assert!(!reqs[1].0.contains(AFTER_PREAMBLE));
    assert_eq!(reqs[1].1, "World");
}

#[tokio::test]
async fn middle_line_sees_translated_past_and_raw_future() {
    let client = ScriptedClient::default();
    let translator = LineTranslator::new(&client, approx(), "en", "pt");
    translator
        .translate("l0\nl1\nl2\nl3\nl4", None)
        .await
        .unwrap();

    let reqs = client.requests();
    let (prompt, user) = &reqs[3];
    assert_eq!(user, "l3");
    assert!(prompt.contains(&format!("{BEFORE_PREAMBLE}\nl0!\nl1!\nl2!")));
    assert!(prompt.contains(&format!("{AFTER_PREAMBLE}\nl4\n")));
    assert!(!prompt.contains("l4!"));
}

#[tokio::test]
async fn context_window_is_capped_at_three() {
    let client = ScriptedClient::default();
    let translator = LineTranslator::new(&client, approx(), "en", "pt");
    translator
        .translate("a\nb\nc\nd\ne\nf\ng", None)
        .await
        .unwrap();

    let (prompt, _) = &client.requests()[3];
    assert!(prompt.contains(&format!("{BEFORE_PREAMBLE}\na!\nb!\nc!\n")));
    assert!(prompt.contains(&format!("{AFTER_PREAMBLE}\ne\nf\ng\n")));
}

#[tokio::test]
async fn unknown_language_code_is_used_verbatim() {
    let client = ScriptedClient::default();
    let translator = LineTranslator::new(&client, approx(), "xx", "pt");
    translator.translate("Bonjour", None).await.unwrap();
    assert!(client.requests()[0].0.contains("from xx to Portuguese"));
}

#[tokio::test]
async fn line_count_and_blank_positions_are_preserved() {
    let inputs = [
        "",
        "\n",
        "only",
        "a\n\n\nb",
        "\n\nx\n  \ny\n\n",
        "# Title\n\n- one\n- two\n\n| a | b |\n|---|---|\n",
    ];
    for text in inputs {
        let client = ScriptedClient::default();
        let translator = LineTranslator::new(&client, approx(), "en", "pt");
        let out = translator.translate(text, None).await.unwrap();

        let src: Vec<&str> = text.split('\n').collect();
        let dst: Vec<&str> = out.text.split('\n').collect();
        assert_eq!(src.len(), dst.len(), "line count for {text:?}");
        for (s, d) in src.iter().zip(&dst) {
            assert_eq!(s.trim().is_empty(), d.is_empty(), "blank mismatch in {text:?}");
        }
        let non_blank = src.iter().filter(|l| !l.trim().is_empty()).count();
        assert_eq!(client.requests().len(), non_blank);
        assert_eq!(out.model_calls, non_blank);
    }
}

#[tokio::test]
async fn empty_model_reply_becomes_blank_line() {
    let client = ScriptedClient::with(&[("drop me", "   ")]);
    let translator = LineTranslator::new(&client, approx(), "en", "pt");
    let out = translator.translate("keep\ndrop me\nkeep", None).await.unwrap();
    assert_eq!(out.text, "keep!\n\nkeep!");
    assert_eq!(out.model_calls, 3);
}

// ── Callbacks and accounting ─────────────────────────────────────────────────

#[tokio::test]
async fn callbacks_fire_in_order() {
    let client = ScriptedClient::default();
    let recorder = Recorder::default();
    let translator = LineTranslator::new(&client, approx(), "en", "pt");
    translator.translate("a\n\nb", Some(&recorder)).await.unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 3",
            "line 1/3",
            "tokens",
            "line 2/3",
            "line 3/3",
            "tokens",
            "complete 3 2",
        ]
    );
}

#[tokio::test]
async fn ledger_never_decreases() {
    let client = ScriptedClient::default();
    let recorder = Recorder::default();
    let translator = LineTranslator::new(&client, approx(), "en", "pt");
    translator
        .translate("one two\nthree\n\nfour five six\nseven", Some(&recorder))
        .await
        .unwrap();

    let ledgers = recorder.ledgers.lock().unwrap().clone();
    assert_eq!(ledgers.len(), 4);
    for pair in ledgers.windows(2) {
        assert!(pair[1].input_tokens >= pair[0].input_tokens);
        assert!(pair[1].output_tokens >= pair[0].output_tokens);
        assert!(pair[1].total_cost >= pair[0].total_cost);
    }
    let last = ledgers.last().unwrap();
    assert!((last.total_cost - (last.input_cost + last.output_cost)).abs() < 1e-12);
}

#[tokio::test]
async fn broken_tokenizer_still_produces_costs() {
    let client = ScriptedClient::default();
    let accountant =
        TokenAccountant::with_encoder(Arc::new(BrokenTokenizer), ModelPricing::GPT_4O_MINI);
    let translator = LineTranslator::new(&client, accountant, "en", "pt");
    let out = translator
        .translate("The quick brown fox\njumps over", None)
        .await
        .unwrap();

    assert!(out.ledger.input_tokens > 0);
    assert!(out.ledger.output_tokens > 0);
    assert!(out.ledger.input_cost > 0.0);
    assert!(out.ledger.output_cost > 0.0);
}

#[tokio::test]
async fn fn_callbacks_see_every_line() {
    let progress = Arc::new(Mutex::new(Vec::new()));
    let p = Arc::clone(&progress);
    let callbacks = FnCallbacks::new().on_progress(move |done, total| {
        p.lock().unwrap().push((done, total));
    });

    let client = ScriptedClient::default();
    let translator = LineTranslator::new(&client, approx(), "en", "pt");
    translator.translate("x\n\ny\n", Some(&callbacks)).await.unwrap();

    assert_eq!(
        *progress.lock().unwrap(),
        vec![(1, 4), (2, 4), (3, 4), (4, 4)]
    );
}

// ── Failure ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn model_failure_aborts_without_partial_output() {
    let client = FlakyClient {
        ok: 1,
        seen: Mutex::new(0),
    };
    let recorder = Recorder::default();
    let translator = LineTranslator::new(&client, approx(), "en", "pt");
    let err = translator
        .translate("first\n\nsecond\nthird", Some(&recorder))
        .await
        .unwrap_err();

    match err {
        TranslateError::LlmApiError { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("429"));
        }
        other => panic!("unexpected error: {other}"),
    }
    let events = recorder.events.lock().unwrap();
    assert!(!events.iter().any(|e| e.starts_with("complete")));
}

// ── Full pipeline ────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_pipeline_with_fake_ocr() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    let pdf = write_pdf(&dir);
    let config = TranslationConfig::builder()
        .target_lang("es")
        .page_separator(PageSeparator::HorizontalRule)
        .build()
        .unwrap();
    let ocr = FakeOcr(vec!["# Intro\r\n\r\nText one.", "Text two."]);
    let client = ScriptedClient::default();

    let out = translate_pdf_with(&pdf, &config, &ocr, &client).await.unwrap();

    assert_eq!(out.source_markdown, "# Intro\n\nText one.\n\n---\n\nText two.");
    assert_eq!(out.markdown, "# Intro!\n\nText one.!\n\n---!\n\nText two.!");
    assert_eq!(out.pages.len(), 2);
    assert_eq!(out.pages[1].page, 2);
    assert_eq!(out.stats.pages, 2);
    assert_eq!(out.stats.total_lines, 7);
    assert_eq!(out.stats.model_calls, 4);
    assert_eq!(out.stats.blank_lines, 3);
    assert_eq!(out.target_lang, "es");
    assert!(client.requests()[0].0.contains("from English to Spanish"));
}

#[tokio::test]
async fn ocr_without_text_is_an_empty_document() {
    let dir = tempfile::TempDir::new().unwrap();
    let pdf = write_pdf(&dir);
    let config = TranslationConfig::default();
    let client = ScriptedClient::default();

    let err = translate_pdf_with(&pdf, &config, &FakeOcr(vec!["", "  \n"]), &client)
        .await
        .unwrap_err();
    assert!(matches!(err, TranslateError::EmptyDocument { .. }));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn non_pdf_input_is_rejected_before_ocr() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, "just text").unwrap();
    let client = ScriptedClient::default();

    let err = translate_pdf_with(
        path.to_string_lossy(),
        &TranslationConfig::default(),
        &FakeOcr(vec!["never used"]),
        &client,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TranslateError::NotAPdf { .. }));
}

#[tokio::test]
async fn markdown_input_keeps_caller_line_structure() {
    init_tracing();
    let client = ScriptedClient::default();
    let input = "Para\n\n\n\n\nNext line  \nhard break";
    let out = translate_markdown_with(input, &TranslationConfig::default(), &client)
        .await
        .unwrap();

    assert_eq!(out.source_markdown, input);
    let src: Vec<&str> = input.split('\n').collect();
    let dst: Vec<&str> = out.markdown.split('\n').collect();
    assert_eq!(src.len(), dst.len());
    for (s, d) in src.iter().zip(&dst) {
        assert_eq!(s.trim().is_empty(), d.is_empty());
    }
    assert_eq!(out.stats.blank_lines, 4);
    assert_eq!(client.requests().len(), 3);
    assert!(out.pages.is_empty());
    assert_eq!(out.stats.pages, 0);
}

#[tokio::test]
async fn markdown_input_line_endings_are_normalised() {
    let client = ScriptedClient::with(&[("Hi", "Oi")]);
    let input = "\u{FEFF}Hi\r\n\r\nHi";
    let out = translate_markdown_with(input, &TranslationConfig::default(), &client)
        .await
        .unwrap();
    assert_eq!(out.source_markdown, "Hi\n\nHi");
    assert_eq!(out.markdown, "Oi\n\nOi");
}

#[tokio::test]
async fn outputs_are_written_with_download_names() {
    let client = ScriptedClient::with(&[("# Title", "# Titre"), ("Body", "Corps")]);
    let config = TranslationConfig::builder().target_lang("fr").build().unwrap();
    let out = translate_markdown_with("# Title\n\nBody", &config, &client)
        .await
        .unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let written = write_outputs(&out, dir.path(), "paper", true).await.unwrap();
    assert_eq!(written.len(), 3);

    let source = std::fs::read_to_string(dir.path().join("paper.md")).unwrap();
    let translated = std::fs::read_to_string(dir.path().join("paper_fr.md")).unwrap();
    let html = std::fs::read_to_string(dir.path().join("paper_fr.html")).unwrap();
    assert_eq!(source, "# Title\n\nBody\n");
    assert_eq!(translated, "# Titre\n\nCorps\n");
    assert!(html.contains("<h1>Titre</h1>"));
    assert!(html.contains("lang=\"fr\""));
}

#[tokio::test]
async fn output_serialises_to_json() {
    let client = ScriptedClient::default();
    let out = translate_markdown_with("a\nb", &TranslationConfig::default(), &client)
        .await
        .unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["markdown"], "a!\nb!");
    assert_eq!(json["stats"]["model_calls"], 2);
    assert!(json["ledger"]["input_tokens"].as_u64().unwrap() > 0);
}
