//! Replay command implementation.

use super::{replay_feed, StoreOptions};
use spanlog_core::{LogStore, ManifestFilter, RenderOptions};
use std::io::Write;
use std::path::Path;

/// Runs the replay command.
pub fn run(
    path: &Path,
    manifests: &[String],
    prefix: bool,
    options: &StoreOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = replay_feed(path, options)?;
    let text = render(&store, manifests, prefix);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn render(store: &LogStore, manifests: &[String], prefix: bool) -> String {
    let filter = if manifests.is_empty() {
        ManifestFilter::All
    } else {
        ManifestFilter::only(manifests.iter().cloned())
    };
    if !filter.is_valid() {
        tracing::warn!("manifest filter contains an empty name; nothing to show");
    }
    store.render(
        &filter,
        RenderOptions {
            prefix_manifest: prefix,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use spanlog_testkit::{batch, write_feed_file};

    fn replayed() -> LogStore {
        let feed = write_feed_file(&[
            batch("build-1", Some("web"), &["Compiling\n"]),
            batch("build-2", Some("api"), &["Starting\n"]),
            batch("build-1", Some("web"), &["Done\n"]),
        ]);
        replay_feed(feed.path(), &StoreOptions::default()).unwrap()
    }

    #[test]
    fn renders_everything_in_arrival_order() {
        let store = replayed();
        assert_eq!(render(&store, &[], false), "Compiling\nStarting\nDone\n");
    }

    #[test]
    fn renders_one_manifest_with_prefix() {
        let store = replayed();
        let text = render(&store, &["web".to_string()], true);
        assert_eq!(text, "web │ Compiling\nweb │ Done\n");
    }

    #[test]
    fn empty_manifest_name_renders_nothing() {
        let store = replayed();
        assert_eq!(render(&store, &[String::new()], false), "");
    }
}
