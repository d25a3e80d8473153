use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, is_empty};
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const OPENAI_TEST_MODEL: &str = "gpt-4o-mini";
const FIREWORKS_TEST_MODEL: &str = "accounts/fireworks/models/kimi-k2-instruct-0905";

fn scrub_env(cmd: &mut Command) {
    cmd.env_remove("MG_PROVIDER")
        .env_remove("MG_MODEL")
        .env_remove("MG_EMBEDDING_MODEL")
        .env_remove("MG_TEMPERATURE")
        .env_remove("MG_MAX_TOKENS")
        .env_remove("MG_TIMEOUT")
        .env_remove("MG_RETRIES")
        .env_remove("MG_RETRY_DELAY")
        .env_remove("MG_CONFIG")
        .env_remove("OPENAI_API_KEY")
        .env_remove("FIREWORKS_API_KEY");
}

fn mgen_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mgen"));
    scrub_env(&mut cmd);
    cmd
}

fn menugen_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("menugen"));
    scrub_env(&mut cmd);
    cmd
}

fn unique_temp_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("mgen-test-{label}-{nanos}"))
}

fn parse_stdout_json(output: &[u8]) -> Value {
    let text = String::from_utf8(output.to_vec()).expect("stdout should be utf-8");
    serde_json::from_str(text.trim()).expect("stdout should contain valid JSON")
}

#[test]
fn dry_run_succeeds_without_api_key() {
    let assert = mgen_cmd()
        .args([
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--model",
            OPENAI_TEST_MODEL,
            "--dry-run",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["dry_run"], Value::Bool(true));
    assert_eq!(body["provider"], Value::String("openai".to_string()));
    assert_eq!(body["model"], Value::String(OPENAI_TEST_MODEL.to_string()));
    assert_eq!(body["runner"], Value::String("sequential".to_string()));
    assert_eq!(body["cuisine"], Value::String("Italian".to_string()));
}

#[test]
fn dry_run_plan_describes_the_two_step_pipeline() {
    let assert = mgen_cmd()
        .args([
            "--cuisine",
            "Mexican",
            "--runner",
            "manual",
            "--model",
            OPENAI_TEST_MODEL,
            "--dry-run",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    let steps = body["pipeline"]["steps"]
        .as_array()
        .expect("steps should be an array");
    assert_eq!(steps.len(), 2);
    assert_eq!(
        steps[0]["output_key"],
        Value::String("restaurant_name".to_string())
    );
    assert_eq!(
        steps[1]["output_key"],
        Value::String("menu_items".to_string())
    );
    assert_eq!(
        steps[1]["input_variables"],
        json!(["restaurant_name"])
    );
    assert_eq!(
        body["pipeline"]["input_variables"],
        json!(["cuisine"])
    );
    assert_eq!(
        body["pipeline"]["output_variables"],
        json!(["restaurant_name", "menu_items"])
    );
}

#[test]
fn dry_run_request_defaults_are_populated() {
    let assert = mgen_cmd()
        .args([
            "--cuisine",
            "Thai",
            "--runner",
            "sequential",
            "--model",
            OPENAI_TEST_MODEL,
            "--dry-run",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["request"]["temperature"], json!(0.7));
    assert_eq!(body["request"]["max_tokens"], Value::Null);
    assert_eq!(body["request"]["timeout_secs"], Value::Null);
    assert_eq!(body["request"]["retries"], Value::from(0));
    assert_eq!(body["request"]["retry_delay_ms"], Value::from(500));
    assert_eq!(body["save"]["enabled"], Value::Bool(true));
    assert_eq!(body["save"]["output_dir"], Value::String(".".to_string()));
}

#[test]
fn no_save_disables_the_report_file_in_the_plan() {
    let assert = mgen_cmd()
        .args([
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--model",
            OPENAI_TEST_MODEL,
            "--no-save",
            "--dry-run",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["save"]["enabled"], Value::Bool(false));
}

#[test]
fn output_dir_flag_is_reflected_in_the_plan() {
    let dir = unique_temp_path("output-dir");
    let assert = mgen_cmd()
        .args([
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--model",
            OPENAI_TEST_MODEL,
            "--output-dir",
            dir.to_string_lossy().as_ref(),
            "--dry-run",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(
        body["save"]["output_dir"],
        Value::String(dir.to_string_lossy().into_owned())
    );
}

#[test]
fn capability_failure_writes_no_report_file() {
    let dir = unique_temp_path("no-report");
    fs::create_dir_all(&dir).expect("output dir should be creatable");

    // No API key is present, so the first step fails before any request.
    mgen_cmd()
        .args([
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--model",
            OPENAI_TEST_MODEL,
            "--output-dir",
            dir.to_string_lossy().as_ref(),
        ])
        .assert()
        .failure()
        .stderr(contains("OPENAI_API_KEY is not set"));

    let entries = fs::read_dir(&dir).expect("output dir should be readable");
    assert_eq!(entries.count(), 0);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn dry_run_show_usage_prints_unavailable() {
    mgen_cmd()
        .args([
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--model",
            OPENAI_TEST_MODEL,
            "--dry-run",
            "--show-usage",
        ])
        .assert()
        .success()
        .stderr(contains("usage: unavailable latency_ms=0 (dry-run)"));
}

#[test]
fn missing_model_returns_explicit_error() {
    mgen_cmd()
        .args(["--cuisine", "Italian", "--runner", "sequential"])
        .assert()
        .failure()
        .stderr(contains("No model provided. Use --model or set MG_MODEL."));
}

#[test]
fn invalid_provider_from_env_returns_error() {
    mgen_cmd()
        .env("MG_PROVIDER", "bad")
        .args([
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--model",
            "x",
        ])
        .assert()
        .failure()
        .stderr(contains(
            "Invalid MG_PROVIDER 'bad'. Supported values: openai, fireworks.",
        ));
}

#[test]
fn invalid_runner_value_returns_explicit_error() {
    mgen_cmd()
        .args([
            "--cuisine",
            "Italian",
            "--runner",
            "parallel",
            "--model",
            OPENAI_TEST_MODEL,
        ])
        .assert()
        .failure()
        .stderr(contains(
            "Invalid --runner 'parallel'. Supported values: manual, sequential.",
        ));
}

#[test]
fn interactive_choice_and_cuisine_come_from_stdin() {
    let assert = mgen_cmd()
        .args(["--model", OPENAI_TEST_MODEL, "--dry-run"])
        .write_stdin("2\nItalian\n")
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["runner"], Value::String("sequential".to_string()));
    assert_eq!(body["cuisine"], Value::String("Italian".to_string()));
}

#[test]
fn interactive_choice_one_selects_the_manual_runner() {
    let assert = mgen_cmd()
        .args(["--model", OPENAI_TEST_MODEL, "--dry-run"])
        .write_stdin("1\nMexican\n")
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["runner"], Value::String("manual".to_string()));
}

#[test]
fn interactive_invalid_choice_returns_error() {
    mgen_cmd()
        .args(["--model", OPENAI_TEST_MODEL, "--dry-run"])
        .write_stdin("3\n")
        .assert()
        .failure()
        .stderr(contains("Invalid choice '3'. Enter 1 or 2."));
}

#[test]
fn empty_cuisine_from_stdin_is_accepted() {
    let assert = mgen_cmd()
        .args(["--model", OPENAI_TEST_MODEL, "--dry-run"])
        .write_stdin("1\n\n")
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["cuisine"], Value::String(String::new()));
}

#[test]
fn profile_loads_provider_and_model_for_dry_run() {
    let config_path = unique_temp_path("config");
    fs::write(
        &config_path,
        "[profiles.fw]\nprovider = \"fireworks\"\nmodel = \"accounts/fireworks/models/kimi-k2-instruct-0905\"\n",
    )
    .expect("config should be writable");

    let assert = mgen_cmd()
        .env("MG_CONFIG", &config_path)
        .args([
            "--profile",
            "fw",
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--dry-run",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["provider"], Value::String("fireworks".to_string()));
    assert_eq!(
        body["model"],
        Value::String(FIREWORKS_TEST_MODEL.to_string())
    );
}

#[test]
fn profile_is_not_implicit_when_not_passed() {
    let config_path = unique_temp_path("config-no-implicit");
    fs::write(
        &config_path,
        "[profiles.default]\nprovider = \"fireworks\"\nmodel = \"accounts/fireworks/models/kimi-k2-instruct-0905\"\n",
    )
    .expect("config should be writable");

    mgen_cmd()
        .env("MG_CONFIG", &config_path)
        .args(["--cuisine", "Italian", "--runner", "sequential"])
        .assert()
        .failure()
        .stderr(contains("No model provided. Use --model or set MG_MODEL."));
}

#[test]
fn precedence_for_temperature_and_timeout_is_respected() {
    let config_path = unique_temp_path("precedence-options");
    fs::write(
        &config_path,
        "[profiles.fw]\nprovider = \"fireworks\"\nmodel = \"accounts/fireworks/models/kimi-k2-instruct-0905\"\ntemperature = 0.1\ntimeout = 7\n",
    )
    .expect("config should be writable");

    let env_over_profile = mgen_cmd()
        .env("MG_CONFIG", &config_path)
        .env("MG_TEMPERATURE", "0.6")
        .env("MG_TIMEOUT", "21")
        .args([
            "--profile",
            "fw",
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--dry-run",
        ])
        .assert()
        .success();

    let env_body = parse_stdout_json(&env_over_profile.get_output().stdout);
    assert_eq!(env_body["request"]["temperature"], json!(0.6));
    assert_eq!(env_body["request"]["timeout_secs"], Value::from(21));

    let cli_over_env = mgen_cmd()
        .env("MG_CONFIG", &config_path)
        .env("MG_TEMPERATURE", "0.6")
        .env("MG_TIMEOUT", "21")
        .args([
            "--profile",
            "fw",
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--temperature",
            "1.2",
            "--timeout",
            "33",
            "--dry-run",
        ])
        .assert()
        .success();

    let cli_body = parse_stdout_json(&cli_over_env.get_output().stdout);
    assert_eq!(cli_body["request"]["temperature"], json!(1.2));
    assert_eq!(cli_body["request"]["timeout_secs"], Value::from(33));
}

#[test]
fn profile_env_and_cli_precedence_is_respected() {
    let config_path = unique_temp_path("precedence");
    fs::write(
        &config_path,
        "[profiles.fw]\nprovider = \"fireworks\"\nmodel = \"profile-model\"\n",
    )
    .expect("config should be writable");

    let assert = mgen_cmd()
        .env("MG_CONFIG", &config_path)
        .env("MG_PROVIDER", "openai")
        .env("MG_MODEL", "env-model")
        .args([
            "--profile",
            "fw",
            "--provider",
            "fireworks",
            "--model",
            "cli-model",
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--dry-run",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["provider"], Value::String("fireworks".to_string()));
    assert_eq!(body["model"], Value::String("cli-model".to_string()));
}

#[test]
fn profile_show_usage_applies_without_the_flag() {
    let config_path = unique_temp_path("profile-show-usage");
    fs::write(
        &config_path,
        "[profiles.loud]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\nshow_usage = true\n",
    )
    .expect("config should be writable");

    mgen_cmd()
        .env("MG_CONFIG", &config_path)
        .args([
            "--profile",
            "loud",
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--dry-run",
        ])
        .assert()
        .success()
        .stderr(contains("usage: unavailable latency_ms=0 (dry-run)"));
}

#[test]
fn verbose_does_not_leak_api_key() {
    let secret = "openai-secret-value";

    mgen_cmd()
        .env("OPENAI_API_KEY", secret)
        .args([
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--model",
            OPENAI_TEST_MODEL,
            "--dry-run",
            "--verbose",
        ])
        .assert()
        .success()
        .stderr(contains("api_key_present=true").and(contains(secret).not()));
}

#[test]
fn quiet_suppresses_show_usage_on_stderr() {
    mgen_cmd()
        .args([
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--model",
            OPENAI_TEST_MODEL,
            "--dry-run",
            "--show-usage",
            "--quiet",
        ])
        .assert()
        .success()
        .stderr(is_empty());
}

#[test]
fn quiet_suppresses_verbose_logs_on_stderr() {
    mgen_cmd()
        .args([
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--model",
            OPENAI_TEST_MODEL,
            "--dry-run",
            "--verbose",
            "--quiet",
        ])
        .assert()
        .success()
        .stderr(is_empty());
}

#[test]
fn quiet_keeps_fatal_errors_visible() {
    mgen_cmd()
        .args(["--cuisine", "Italian", "--runner", "sequential", "--quiet"])
        .assert()
        .failure()
        .stderr(contains("No model provided. Use --model or set MG_MODEL."));
}

#[test]
fn version_prints_build_metadata() {
    mgen_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("commit:").and(contains("built:")));
}

#[test]
fn menugen_generate_version_prints_metadata() {
    menugen_cmd()
        .args(["generate", "--version"])
        .assert()
        .success()
        .stdout(contains("commit:").and(contains("built:")));
}

#[test]
fn menugen_generate_dry_run_matches_mgen_output_shape() {
    let assert = menugen_cmd()
        .args([
            "generate",
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
            "--model",
            OPENAI_TEST_MODEL,
            "--dry-run",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["command"], Value::String("generate".to_string()));
    assert_eq!(body["provider"], Value::String("openai".to_string()));
    assert_eq!(body["runner"], Value::String("sequential".to_string()));
}

#[test]
fn profile_file_missing_returns_explicit_error() {
    let config_path = unique_temp_path("missing-config");

    mgen_cmd()
        .env("MG_CONFIG", &config_path)
        .args([
            "--profile",
            "fw",
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
        ])
        .assert()
        .failure()
        .stderr(contains("Failed to read config file"));
}

#[test]
fn invalid_profile_toml_returns_parse_error() {
    let config_path = unique_temp_path("invalid-toml");
    fs::write(&config_path, "[profiles.bad\nprovider = \"openai\"")
        .expect("config should be writable");

    mgen_cmd()
        .env("MG_CONFIG", &config_path)
        .args([
            "--profile",
            "bad",
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
        ])
        .assert()
        .failure()
        .stderr(contains("Failed to parse config file"));
}

#[test]
fn profile_not_found_returns_error() {
    let config_path = unique_temp_path("profile-not-found");
    fs::write(&config_path, "[profiles.fw]\nprovider = \"fireworks\"\n")
        .expect("config should be writable");

    mgen_cmd()
        .env("MG_CONFIG", &config_path)
        .args([
            "--profile",
            "missing",
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
        ])
        .assert()
        .failure()
        .stderr(contains("Profile 'missing' not found"));
}

#[test]
fn invalid_profile_provider_returns_error() {
    let config_path = unique_temp_path("invalid-provider");
    fs::write(
        &config_path,
        "[profiles.bad]\nprovider = \"unknown\"\nmodel = \"m\"\n",
    )
    .expect("config should be writable");

    mgen_cmd()
        .env("MG_CONFIG", &config_path)
        .args([
            "--profile",
            "bad",
            "--cuisine",
            "Italian",
            "--runner",
            "sequential",
        ])
        .assert()
        .failure()
        .stderr(contains("Invalid profile provider 'unknown'"));
}

#[test]
fn config_check_validates_a_profile() {
    let config_path = unique_temp_path("config-check");
    fs::write(
        &config_path,
        "[profiles.fw]\nprovider = \"fireworks\"\nmodel = \"m\"\n",
    )
    .expect("config should be writable");

    menugen_cmd()
        .env("MG_CONFIG", &config_path)
        .args(["config", "check", "--profile", "fw"])
        .assert()
        .success()
        .stdout(contains("config OK:"));
}

#[test]
fn config_check_rejects_an_unsupported_profile_provider() {
    let config_path = unique_temp_path("config-check-bad");
    fs::write(
        &config_path,
        "[profiles.bad]\nprovider = \"unknown\"\nmodel = \"m\"\n",
    )
    .expect("config should be writable");

    menugen_cmd()
        .env("MG_CONFIG", &config_path)
        .args(["config", "check", "--profile", "bad"])
        .assert()
        .failure()
        .stderr(contains("Invalid profile provider 'unknown'"));
}

#[test]
fn config_path_prints_the_resolved_location() {
    let config_path = unique_temp_path("config-path");

    menugen_cmd()
        .env("MG_CONFIG", &config_path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(contains(config_path.to_string_lossy().into_owned()));
}

#[test]
fn chat_dry_run_defaults_to_window_five() {
    let assert = menugen_cmd()
        .args(["chat", "--model", OPENAI_TEST_MODEL, "--dry-run"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["command"], Value::String("chat".to_string()));
    assert_eq!(body["window"], Value::from(5));
    assert_eq!(body["template_variables"], json!(["history", "input"]));
}

#[test]
fn chat_window_flag_overrides_the_default() {
    let assert = menugen_cmd()
        .args([
            "chat",
            "--model",
            OPENAI_TEST_MODEL,
            "--window",
            "2",
            "--dry-run",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["window"], Value::from(2));
}

#[test]
fn chat_exit_word_ends_the_conversation_without_any_request() {
    // No API key is present, so reaching the provider would fail loudly.
    menugen_cmd()
        .args(["chat", "--model", OPENAI_TEST_MODEL])
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout(contains("Goodbye! Have a great day!"));
}

#[test]
fn chat_end_of_input_ends_the_conversation() {
    menugen_cmd()
        .args(["chat", "--model", OPENAI_TEST_MODEL])
        .assert()
        .success()
        .stdout(contains("Conversational assistant with memory"));
}

#[test]
fn chat_skips_blank_lines_before_exit() {
    menugen_cmd()
        .args(["chat", "--model", OPENAI_TEST_MODEL])
        .write_stdin("\n   \nquit\n")
        .assert()
        .success()
        .stdout(contains("Goodbye! Have a great day!"));
}

#[test]
fn embed_dry_run_reports_inputs_and_dimensions() {
    let assert = menugen_cmd()
        .args([
            "embed",
            "--model",
            "nomic-ai/nomic-embed-text-v1.5",
            "--provider",
            "fireworks",
            "--dimensions",
            "64",
            "--dry-run",
            "What is the capital of India?",
            "Delhi is the capital of India",
            "The Everest is the highest mountain",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["command"], Value::String("embed".to_string()));
    assert_eq!(body["provider"], Value::String("fireworks".to_string()));
    assert_eq!(body["dimensions"], Value::from(64));
    assert_eq!(body["inputs"], Value::from(3));
}

#[test]
fn embed_model_resolves_from_its_own_env_var() {
    let assert = menugen_cmd()
        .env("MG_EMBEDDING_MODEL", "text-embedding-3-small")
        .args(["embed", "--dry-run", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(
        body["model"],
        Value::String("text-embedding-3-small".to_string())
    );
    assert_eq!(body["dimensions"], Value::Null);
}

#[test]
fn embed_without_a_model_returns_explicit_error() {
    menugen_cmd()
        .args(["embed", "hello"])
        .assert()
        .failure()
        .stderr(contains(
            "No embedding model provided. Use --model or set MG_EMBEDDING_MODEL.",
        ));
}

#[test]
fn generate_help_includes_examples() {
    menugen_cmd()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(contains("Examples:").and(contains("--runner")));
}

#[test]
fn help_mentions_completion_command() {
    menugen_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("completion").and(contains("Generate shell completion script")));
}

#[test]
fn completion_bash_outputs_script() {
    menugen_cmd()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(contains("_menugen").and(contains("complete")));
}

#[test]
fn completion_fish_outputs_script() {
    menugen_cmd()
        .args(["completion", "fish"])
        .assert()
        .success()
        .stdout(contains("complete -c menugen"));
}
