//! Status vocabularies reported by the backend.
//!
//! Each backend state machine has its own open string set. They are kept as
//! separate types on purpose: preview jobs use `adjusting`/`finalizing`, video
//! jobs use `planning`/`editing`/`uploading`, and so on. Values this client
//! does not know are preserved in `Other` and treated as still in progress.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display label and terminality shared by every status vocabulary.
pub trait Lifecycle {
    /// Human readable label for tables and status bars.
    fn label(&self) -> &str;
    /// True when polling must stop.
    fn is_terminal(&self) -> bool;
    /// True for terminal failure states.
    fn is_failure(&self) -> bool;
}

macro_rules! open_status {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, $label:literal, $terminal:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Value not known to this client.
            Other(String),
        }

        impl $name {
            /// Wire representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Other(s) => s.as_str(),
                }
            }

            /// Filter choices for list screens; `None` means "all".
            #[allow(dead_code)]
            pub fn filters() -> Vec<Option<Self>> {
                vec![None $(, Some(Self::$variant))+]
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $wire => Self::$variant, )+
                    _ => Self::Other(s),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(s: $name) -> String {
                match s {
                    $name::Other(s) => s,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl Lifecycle for $name {
            fn label(&self) -> &str {
                match self {
                    $( Self::$variant => $label, )+
                    Self::Other(s) => s.as_str(),
                }
            }

            fn is_terminal(&self) -> bool {
                match self {
                    $( Self::$variant => $terminal, )+
                    Self::Other(_) => false,
                }
            }

            fn is_failure(&self) -> bool {
                self.as_str() == "failed"
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

open_status! {
    /// Video creation job (`/api/jobs/*`).
    JobStatus {
        Pending => "pending", "Pending", false;
        Planning => "planning", "Planning", false;
        CollectingAssets => "collecting_assets", "Collecting assets", false;
        Editing => "editing", "Editing", false;
        Uploading => "uploading", "Uploading", false;
        Completed => "completed", "Completed", true;
        Failed => "failed", "Failed", true;
    }
}

open_status! {
    /// Low resolution preview job (`/api/preview/*`).
    PreviewStatus {
        Pending => "pending", "Pending", false;
        Generating => "generating", "Generating", false;
        Adjusting => "adjusting", "Adjusting", false;
        Finalizing => "finalizing", "Finalizing", false;
        Completed => "completed", "Completed", true;
        Finalized => "finalized", "Finalized", true;
        Failed => "failed", "Failed", true;
    }
}

open_status! {
    /// Batch remix job (`/api/batch/*`).
    BatchStatus {
        Pending => "pending", "Waiting", false;
        Running => "running", "Running", false;
        Completed => "completed", "Completed", true;
        Failed => "failed", "Failed", true;
    }
}

open_status! {
    /// Draft project state. Transitions are driven by the backend only.
    DraftStatus {
        Editing => "editing", "Editing", false;
        AssetsReady => "assets_ready", "Assets ready", false;
        Converting => "converting", "Converting", false;
        Finalized => "finalized", "Finalized", true;
    }
}

open_status! {
    /// Downloaded video processing state (`/api/videos`).
    VideoStatus {
        Pending => "pending", "Waiting", false;
        Downloaded => "downloaded", "Downloaded", false;
        Translated => "translated", "Translated", false;
        Completed => "completed", "Completed", true;
        Failed => "failed", "Failed", true;
    }
}

/// Label for a list filter choice.
pub fn filter_label<T: Lifecycle>(filter: &Option<T>) -> &str {
    match filter {
        None => "All",
        Some(s) => s.label(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_job_statuses() {
        assert!(JobStatus::from("completed").is_terminal());
        assert!(JobStatus::from("failed").is_terminal());
        assert!(JobStatus::from("failed").is_failure());
        for s in ["pending", "planning", "collecting_assets", "editing", "uploading"] {
            assert!(!JobStatus::from(s).is_terminal(), "{s} should keep polling");
        }
    }

    #[test]
    fn unknown_status_is_kept_and_not_terminal() {
        let s = JobStatus::from("rendering");
        assert_eq!(s, JobStatus::Other("rendering".into()));
        assert_eq!(s.label(), "rendering");
        assert!(!s.is_terminal());
        assert!(!s.is_failure());
    }

    #[test]
    fn preview_vocabulary_differs_from_jobs() {
        assert_eq!(PreviewStatus::from("adjusting"), PreviewStatus::Adjusting);
        assert_eq!(
            JobStatus::from("adjusting"),
            JobStatus::Other("adjusting".into())
        );
        assert_eq!(DraftStatus::from("editing"), DraftStatus::Editing);
        assert!(!DraftStatus::Editing.is_terminal());
    }

    #[test]
    fn serde_uses_wire_strings() {
        let v: Vec<JobStatus> =
            serde_json::from_str(r#"["collecting_assets","mystery"]"#).unwrap();
        assert_eq!(
            v,
            vec![
                JobStatus::CollectingAssets,
                JobStatus::Other("mystery".into())
            ]
        );
        let out = serde_json::to_string(&DraftStatus::AssetsReady).unwrap();
        assert_eq!(out, r#""assets_ready""#);
    }

    #[test]
    fn filters_start_with_all() {
        let f = DraftStatus::filters();
        assert_eq!(f.len(), 5);
        assert_eq!(filter_label(&f[0]), "All");
        assert_eq!(filter_label(&f[2]), "Assets ready");
    }
}
