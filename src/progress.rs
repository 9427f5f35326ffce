use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Shown while the manifest is fetched, versions compared, the download
/// hashed and the binary renamed into place. The current stage name is the message.
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg}")
        .unwrap()
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
}

/// Byte counter shown while the release binary is streamed to disk.
pub fn download_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "\x1b[33m{spinner}\x1b[0m {msg} {bytes}/{total_bytes} ({bytes_per_sec})",
    )
    .unwrap()
    .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
}

/// Finished version check.
pub fn ok_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}").unwrap()
}

/// Failed version check; the message is the user-facing failure line.
pub fn err_style() -> ProgressStyle {
    ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}").unwrap()
}

/// A ticking spinner showing `msg`.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(msg.to_string());
    pb
}
