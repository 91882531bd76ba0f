use storybook_core::{AppViewModel, DownloadStatus, StoryView, Url, ViewState};

const PROCESSING_TEXT: &str = "Generating your story, this can take a few minutes...";

/// Turn the view model into terminal lines. Relative illustration URLs are
/// shown resolved against the form action, the way a browser would load them.
pub fn render(view: &AppViewModel, base: &Url) -> Vec<String> {
    let mut lines = Vec::new();

    if view.processing_visible {
        lines.push(PROCESSING_TEXT.to_string());
    }
    if !view.results_visible {
        return lines;
    }

    lines.push("=== Results ===".to_string());
    match &view.story {
        StoryView::Empty => {}
        StoryView::Text(text) => lines.push(text.clone()),
        StoryView::Embedded { frame, download } => {
            lines.push(format!(
                "[frame {} x {}] {}",
                frame.width, frame.height, frame.src
            ));
            lines.push(format!("[{}] saves as {}", download.label, download.file_name));
        }
    }

    for image in &view.illustrations {
        lines.push(format!("[image] {}: {}", image.alt, resolve(base, &image.src)));
    }

    match &view.download {
        None => {}
        Some(DownloadStatus::Pending) => lines.push("Saving story...".to_string()),
        Some(DownloadStatus::Saved(path)) => lines.push(format!("Saved to {}", path.display())),
        Some(DownloadStatus::Failed(message)) => lines.push(format!("Download failed: {message}")),
    }

    lines
}

/// Short status used for the final line once the app is done.
pub fn status_label(state: ViewState) -> &'static str {
    match state {
        ViewState::Idle => "Idle",
        ViewState::Processing => "Processing",
        ViewState::Shown => "Shown",
    }
}

fn resolve(base: &Url, src: &str) -> String {
    base.join(src)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| src.to_string())
}
