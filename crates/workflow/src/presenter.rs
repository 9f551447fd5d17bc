//! Pure mapping from workflow state to what a view should render.
//!
//! Nothing here has side effects. A view calls
//! [`Workflow::view`](crate::workflow::Workflow::view) (or [`present`] on
//! a snapshot it took itself) and draws the resulting [`ViewModel`].

use genstudio_core::generation::{SourceImagePolicy, WorkflowKind};
use genstudio_core::media::{GenerationResult, MediaKind};
use genstudio_events::Notification;

use crate::controller::LifecycleState;

/// Hint shown in an empty source image slot.
pub const SOURCE_PLACEHOLDER: &str = "Click to upload an image";

/// Everything the presenter needs, captured at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSnapshot {
    pub kind: WorkflowKind,
    pub lifecycle: LifecycleState,
    pub prompt: String,
    pub variant_count: u32,
    pub source_preview: Option<String>,
    pub source_acknowledged: bool,
    pub uploading: bool,
    pub upload_error: Option<String>,
    pub inline_error: Option<String>,
    pub notification: Option<Notification>,
    pub overlay_open: bool,
}

/// The result area of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPane {
    Placeholder(String),
    Loading(String),
    Error(String),
    Media { url: String, kind: MediaKind },
}

/// The source image area, for workflows that take one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePane {
    Empty { hint: &'static str },
    Preview {
        url: String,
        uploading: bool,
        acknowledged: bool,
    },
}

/// Renderable state of one workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub result: ResultPane,
    /// Full-size media shown over the page, when the user opened it.
    pub overlay: Option<GenerationResult>,
    pub source: Option<SourcePane>,
    pub prompt: String,
    pub variant_count: u32,
    /// Choices for the variant selector; empty when the workflow has none.
    pub variant_options: Vec<u32>,
    pub submit_enabled: bool,
    /// Show a spinner on the submit trigger.
    pub submit_busy: bool,
    pub inline_error: Option<String>,
    pub upload_error: Option<String>,
    pub notification: Option<Notification>,
}

/// Map a snapshot to its view model.
pub fn present(snapshot: &WorkflowSnapshot) -> ViewModel {
    let noun = snapshot.kind.media_kind().noun();

    let result = match &snapshot.lifecycle {
        LifecycleState::Failed(message) => ResultPane::Error(message.clone()),
        LifecycleState::Submitting => ResultPane::Loading(format!("Generating {noun}...")),
        LifecycleState::Succeeded(result) => ResultPane::Media {
            url: result.media_url.clone(),
            kind: result.kind,
        },
        LifecycleState::Idle => {
            ResultPane::Placeholder(format!("Generated {noun} will appear here"))
        }
    };

    let overlay = match &snapshot.lifecycle {
        LifecycleState::Succeeded(result) if snapshot.overlay_open => Some(result.clone()),
        _ => None,
    };

    let source = match snapshot.kind.source_image_policy() {
        SourceImagePolicy::NotAccepted => None,
        SourceImagePolicy::Optional | SourceImagePolicy::Required => {
            Some(match &snapshot.source_preview {
                Some(url) => SourcePane::Preview {
                    url: url.clone(),
                    uploading: snapshot.uploading,
                    acknowledged: snapshot.source_acknowledged,
                },
                None => SourcePane::Empty {
                    hint: SOURCE_PLACEHOLDER,
                },
            })
        }
    };

    let range = snapshot.kind.variant_range();
    let variant_options = if range.start() == range.end() {
        Vec::new()
    } else {
        range.collect()
    };

    ViewModel {
        result,
        overlay,
        source,
        prompt: snapshot.prompt.clone(),
        variant_count: snapshot.variant_count,
        variant_options,
        submit_enabled: can_submit(
            snapshot.kind,
            &snapshot.lifecycle,
            &snapshot.prompt,
            snapshot.source_preview.is_some(),
        ),
        submit_busy: snapshot.lifecycle.is_submitting(),
        inline_error: snapshot.inline_error.clone(),
        upload_error: snapshot.upload_error.clone(),
        notification: snapshot.notification.clone(),
    }
}

/// Whether the submit trigger should be enabled: nothing in flight, a
/// non-blank prompt, and a source image if the workflow requires one.
pub fn can_submit(
    kind: WorkflowKind,
    lifecycle: &LifecycleState,
    prompt: &str,
    has_source: bool,
) -> bool {
    if lifecycle.is_submitting() || prompt.trim().is_empty() {
        return false;
    }
    kind.source_image_policy() != SourceImagePolicy::Required || has_source
}

#[cfg(test)]
mod tests {
    use genstudio_events::Severity;

    use super::*;

    fn snapshot(kind: WorkflowKind, lifecycle: LifecycleState) -> WorkflowSnapshot {
        WorkflowSnapshot {
            kind,
            lifecycle,
            prompt: "a red fox".into(),
            variant_count: 1,
            source_preview: None,
            source_acknowledged: false,
            uploading: false,
            upload_error: None,
            inline_error: None,
            notification: None,
            overlay_open: false,
        }
    }

    fn image(url: &str) -> GenerationResult {
        GenerationResult {
            media_url: url.into(),
            kind: MediaKind::Image,
        }
    }

    #[test]
    fn idle_shows_placeholder() {
        let view = present(&snapshot(WorkflowKind::TextToImage, LifecycleState::Idle));
        assert_eq!(
            view.result,
            ResultPane::Placeholder("Generated image will appear here".into())
        );
        assert!(view.submit_enabled);
        assert!(view.source.is_none());
        assert_eq!(view.variant_options, vec![1, 2, 3, 4]);
    }

    #[test]
    fn submitting_shows_progress_and_disables_trigger() {
        let view = present(&snapshot(WorkflowKind::ImageToVideo, LifecycleState::Submitting));
        assert_eq!(view.result, ResultPane::Loading("Generating video...".into()));
        assert!(!view.submit_enabled);
        assert!(view.submit_busy);
        assert!(view.variant_options.is_empty());
    }

    #[test]
    fn failure_keeps_source_preview() {
        let mut snap = snapshot(
            WorkflowKind::ImageToImage,
            LifecycleState::Failed("Error: GPU busy".into()),
        );
        snap.source_preview = Some("blob:genstudio/1".into());

        let view = present(&snap);

        assert_eq!(view.result, ResultPane::Error("Error: GPU busy".into()));
        assert_eq!(
            view.source,
            Some(SourcePane::Preview {
                url: "blob:genstudio/1".into(),
                uploading: false,
                acknowledged: false,
            })
        );
        assert!(view.submit_enabled);
    }

    #[test]
    fn overlay_only_with_result() {
        let mut snap = snapshot(
            WorkflowKind::TextToImage,
            LifecycleState::Succeeded(image("http://o/img/1.png")),
        );
        assert!(present(&snap).overlay.is_none());

        snap.overlay_open = true;
        let view = present(&snap);
        assert_eq!(view.overlay, Some(image("http://o/img/1.png")));
        assert_eq!(
            view.result,
            ResultPane::Media {
                url: "http://o/img/1.png".into(),
                kind: MediaKind::Image,
            }
        );

        snap.lifecycle = LifecycleState::Submitting;
        assert!(present(&snap).overlay.is_none());
    }

    #[test]
    fn image_to_image_needs_source_to_submit() {
        let mut snap = snapshot(WorkflowKind::ImageToImage, LifecycleState::Idle);
        let view = present(&snap);
        assert!(!view.submit_enabled);
        assert_eq!(
            view.source,
            Some(SourcePane::Empty {
                hint: SOURCE_PLACEHOLDER
            })
        );

        snap.source_preview = Some("blob:genstudio/2".into());
        assert!(present(&snap).submit_enabled);
    }

    #[test]
    fn blank_prompt_disables_trigger() {
        assert!(!can_submit(
            WorkflowKind::TextToImage,
            &LifecycleState::Idle,
            "   ",
            false
        ));
        assert!(can_submit(
            WorkflowKind::ImageToVideo,
            &LifecycleState::Failed("x".into()),
            "waves",
            false
        ));
    }

    #[test]
    fn notification_is_passed_through() {
        let mut snap = snapshot(WorkflowKind::ImageToImage, LifecycleState::Idle);
        snap.notification = Some(Notification::new(
            "cat.png uploaded successfully",
            Severity::Success,
        ));
        let view = present(&snap);
        assert_eq!(
            view.notification.map(|n| n.message),
            Some("cat.png uploaded successfully".to_string())
        );
    }
}
