// ADB-backed device channel: every command becomes `adb -s <id> shell input ...`.
use async_trait::async_trait;
use tokio::process::Command;

use crate::config::DeviceConfig;
use crate::device::traits::{CommandOutput, DeviceChannel, DeviceCommand};
use crate::errors::{DroidFlowError, DroidFlowResult};

pub struct AdbChannel {
    adb_path: String,
}

impl AdbChannel {
    pub fn new(adb_path: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
        }
    }

    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::new(config.adb_path.clone())
    }

    pub fn adb_path(&self) -> &str {
        &self.adb_path
    }
}

/// Arguments passed to `adb` for one command.
pub fn adb_args(device_id: &str, command: &DeviceCommand) -> Vec<String> {
    let mut args: Vec<String> = ["-s", device_id, "shell", "input"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    match command {
        DeviceCommand::Swipe {
            start,
            end,
            duration_ms,
        } => {
            args.push("swipe".into());
            args.extend([start.x, start.y, end.x, end.y].iter().map(i32::to_string));
            args.push(duration_ms.to_string());
        }
        DeviceCommand::LongPress { point, duration_ms } => {
            // A zero-length swipe held for the duration is a long press.
            args.push("swipe".into());
            args.extend([point.x, point.y, point.x, point.y].iter().map(i32::to_string));
            args.push(duration_ms.to_string());
        }
        DeviceCommand::KeyEvent { key_code } => {
            args.push("keyevent".into());
            args.push(key_code.to_string());
        }
        DeviceCommand::InputText { text } => {
            args.push("text".into());
            args.push(escape_input_text(text));
        }
    }
    args
}

/// `input text` runs through the device shell: spaces become `%s`, shell
/// metacharacters get a backslash.
pub fn escape_input_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match c {
            ' ' => out.push_str("%s"),
            '\\' | '\'' | '"' | '&' | '<' | '>' | '|' | ';' | '(' | ')' | '$' | '`' | '*' | '~'
            | '?' | '#' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// The device's `input text` turns every `%s` into a space and has no escape
/// for it. A literal `%s` is kept by ending one chunk after the `%` and
/// starting the next with the `s`.
pub fn input_text_chunks(text: &str) -> Vec<String> {
    let parts: Vec<&str> = text.split("%s").collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let lead = if i == 0 { "" } else { "s" };
            let tail = if i == last { "" } else { "%" };
            format!("{lead}{part}{tail}")
        })
        .collect()
}

/// One argument list per `adb` run needed to realize `command`.
pub fn adb_invocations(device_id: &str, command: &DeviceCommand) -> Vec<Vec<String>> {
    match command {
        DeviceCommand::InputText { text } => input_text_chunks(text)
            .into_iter()
            .map(|chunk| adb_args(device_id, &DeviceCommand::InputText { text: chunk }))
            .collect(),
        other => vec![adb_args(device_id, other)],
    }
}

fn stderr_reports_error(stderr: &str) -> bool {
    stderr.contains("Error") || stderr.contains("Exception")
}

impl AdbChannel {
    async fn run_adb(&self, device_id: &str, kind: &str, args: &[String]) -> DroidFlowResult<CommandOutput> {
        tracing::debug!(device = device_id, kind, ?args, "adb command");

        let output = Command::new(&self.adb_path)
            .args(args)
            .output()
            .await
            .map_err(|e| DroidFlowError::Device(format!("failed to run {}: {e}", self.adb_path)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() || stderr_reports_error(&stderr) {
            tracing::warn!(
                device = device_id,
                kind,
                status = ?output.status.code(),
                stderr = %stderr,
                "adb command failed"
            );
            let detail = if stderr.is_empty() { stdout } else { stderr };
            return Ok(CommandOutput::failed(detail));
        }

        Ok(CommandOutput {
            success: true,
            diagnostics: (!stdout.is_empty()).then_some(stdout),
        })
    }
}

#[async_trait]
impl DeviceChannel for AdbChannel {
    /// Stops at the first failed `adb` run.
    async fn send(&self, device_id: &str, command: &DeviceCommand) -> DroidFlowResult<CommandOutput> {
        let mut last = CommandOutput::ok();
        for args in adb_invocations(device_id, command) {
            last = self.run_adb(device_id, command.kind(), &args).await?;
            if !last.success {
                break;
            }
        }
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::coordinator::Point;

    #[test]
    fn swipe_args() {
        let cmd = DeviceCommand::Swipe {
            start: Point::new(540, 1638),
            end: Point::new(540, 1038),
            duration_ms: 300,
        };
        assert_eq!(
            adb_args("emulator-5554", &cmd),
            ["-s", "emulator-5554", "shell", "input", "swipe", "540", "1638", "540", "1038", "300"]
        );
    }

    #[test]
    fn long_press_is_a_stationary_swipe() {
        let cmd = DeviceCommand::LongPress {
            point: Point::new(100, 200),
            duration_ms: 1000,
        };
        assert_eq!(
            adb_args("d1", &cmd)[4..],
            ["swipe", "100", "200", "100", "200", "1000"]
        );
    }

    #[test]
    fn keyevent_args() {
        let args = adb_args("d1", &DeviceCommand::KeyEvent { key_code: 4 });
        assert_eq!(args[4..], ["keyevent", "4"]);
    }

    #[test]
    fn text_is_escaped_for_the_device_shell() {
        assert_eq!(escape_input_text("hello world"), "hello%sworld");
        assert_eq!(escape_input_text("a&b"), "a\\&b");
        assert_eq!(escape_input_text("it's \"ok\""), "it\\'s%s\\\"ok\\\"");
        assert_eq!(escape_input_text("plain"), "plain");
    }

    #[test]
    fn literal_percent_s_survives_input_text() {
        assert_eq!(input_text_chunks("plain text"), ["plain text"]);
        assert_eq!(input_text_chunks("100%sure"), ["100%", "sure"]);
        assert_eq!(input_text_chunks("%s%s"), ["%", "s%", "s"]);
        assert_eq!(input_text_chunks("50%"), ["50%"]);
    }

    #[test]
    fn text_with_percent_s_takes_several_adb_runs() {
        let runs = adb_invocations(
            "d1",
            &DeviceCommand::InputText {
                text: "a %sb".into(),
            },
        );
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0][4..], ["text", "a%s%"]);
        assert_eq!(runs[1][4..], ["text", "sb"]);

        let single = adb_invocations("d1", &DeviceCommand::KeyEvent { key_code: 4 });
        assert_eq!(single, vec![adb_args("d1", &DeviceCommand::KeyEvent { key_code: 4 })]);
    }

    #[tokio::test]
    async fn missing_adb_binary_is_a_device_error() {
        let channel = AdbChannel::new("/nonexistent/droidflow-adb");
        let err = channel
            .send("d1", &DeviceCommand::KeyEvent { key_code: 3 })
            .await
            .unwrap_err();
        assert!(matches!(err, DroidFlowError::Device(_)));
    }
}
