use std::process::Stdio;

use kasane_config::worker::WorkerConfig;
use kasane_types::{WorkerRequest, WorkerResponse};
use tokio::process::Command;

use crate::TranslationWorker;
use crate::error::WorkerError;

/// Runs a fresh worker process per request.
///
/// The region goes on the command line as
/// `<screenshot_path> <x> <y> <width> <height>` and the response is the last
/// JSON line the process prints before exiting.
#[derive(Debug, Clone)]
pub struct OneShotWorker {
    program: String,
    args: Vec<String>,
}

impl OneShotWorker {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    pub async fn run(&self, request: &WorkerRequest) -> Result<WorkerResponse, WorkerError> {
        tracing::debug!("Running one-shot worker for {}", request.screenshot_path);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&request.screenshot_path)
            .arg(request.region_x.to_string())
            .arg(request.region_y.to_string())
            .arg(request.region_width.to_string())
            .arg(request.region_height.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| WorkerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            tracing::debug!(target: "kasane::worker", "{}", line);
        }

        if !output.status.success() {
            return Err(WorkerError::NonZeroExit {
                code: output.status.code(),
                stderr: tail(&stderr, 5),
            });
        }

        parse_last_response(&String::from_utf8_lossy(&output.stdout))
    }
}

/// The last stdout line that parses as a response wins; progress output
/// before it is ignored.
fn parse_last_response(stdout: &str) -> Result<WorkerResponse, WorkerError> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| serde_json::from_str::<WorkerResponse>(line).ok())
        .ok_or_else(|| WorkerError::Protocol("worker printed no JSON response".to_string()))
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[async_trait::async_trait]
impl TranslationWorker for OneShotWorker {
    async fn translate(&self, request: WorkerRequest) -> Result<WorkerResponse, WorkerError> {
        self.run(&request).await
    }

    async fn shutdown(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_json_line_wins() {
        let stdout = "loading\n{\"success\":false,\"error\":\"old\"}\n{\"success\":true,\"textBlocks\":[]}\n\n";
        assert!(parse_last_response(stdout).unwrap().success);
    }

    #[test]
    fn no_json_is_a_protocol_error() {
        assert!(matches!(parse_last_response("nothing here\n"), Err(WorkerError::Protocol(_))));
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc", 2), "b\nc");
        assert_eq!(tail("a", 5), "a");
    }

    #[cfg(unix)]
    mod process {
        use std::time::Duration;

        use kasane_types::Region;

        use super::*;

        fn worker(script: &str) -> OneShotWorker {
            OneShotWorker::new(&WorkerConfig {
                program: "sh".to_string(),
                // $0 is the placeholder name, region args land in $1..$5
                args: vec!["-c".to_string(), script.to_string(), "worker".to_string()],
                ..WorkerConfig::default()
            })
        }

        fn request() -> WorkerRequest {
            WorkerRequest::new("/tmp/shot.png", Region::new(100, 100, 200, 50).unwrap())
        }

        #[tokio::test]
        async fn region_is_passed_as_arguments() {
            let w = worker(r#"printf '{"success":false,"error":"%s %s %s %s %s"}\n' "$1" "$2" "$3" "$4" "$5""#);
            let response = tokio::time::timeout(Duration::from_secs(5), w.translate(request()))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(response.error.as_deref(), Some("/tmp/shot.png 100 100 200 50"));
        }

        #[tokio::test]
        async fn non_zero_exit_is_reported() {
            let w = worker(r#"echo "bad arguments" >&2; exit 1"#);
            let err = w.translate(request()).await.unwrap_err();
            match err {
                WorkerError::NonZeroExit { code, stderr } => {
                    assert_eq!(code, Some(1));
                    assert_eq!(stderr, "bad arguments");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
