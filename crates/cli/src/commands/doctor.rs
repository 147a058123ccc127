use serde::Serialize;
use storefront_client::{HttpProductApi, ProductApi};
use storefront_core::config::{AppConfig, LoadOptions};

use crate::commands::{CommandResult, EXIT_API, EXIT_CONFIG, EXIT_RUNTIME_INIT};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
    #[serde(skip)]
    exit_code: u8,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into(), exit_code: 0 }
    }

    fn fail(name: &'static str, details: impl Into<String>, exit_code: u8) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into(), exit_code }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: format!("skipped because {reason}"),
            exit_code: 0,
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    /// Exit code of the first failing check.
    fn exit_code(&self) -> u8 {
        self.checks
            .iter()
            .find(|check| check.status == CheckStatus::Fail)
            .map(|check| check.exit_code)
            .unwrap_or(0)
    }
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = report.exit_code();

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            match HttpProductApi::new(&config.api) {
                Ok(api) => {
                    checks.push(DoctorCheck::pass(
                        "api_client",
                        format!("client ready for `{}`", api.products_url()),
                    ));
                    checks.push(check_api_reachability(&api));
                }
                Err(error) => {
                    checks.push(DoctorCheck::fail("api_client", error.to_string(), EXIT_CONFIG));
                    checks.push(DoctorCheck::skipped(
                        "api_reachability",
                        "the api client could not be built",
                    ));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string(), EXIT_CONFIG));
            checks.push(DoctorCheck::skipped("api_client", "configuration did not load"));
            checks.push(DoctorCheck::skipped("api_reachability", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_api_reachability(api: &HttpProductApi) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck::fail(
                "api_reachability",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME_INIT,
            );
        }
    };

    match runtime.block_on(api.list()) {
        Ok(products) => DoctorCheck::pass(
            "api_reachability",
            format!("listed {} products from `{}`", products.len(), api.products_url()),
        ),
        Err(error) => DoctorCheck::fail(
            "api_reachability",
            format!("{} ({})", error, error.class()),
            EXIT_API,
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
