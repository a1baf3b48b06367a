//! Transfer state machines for sealbox.
//!
//! This module provides pure, side-effect-free state machines for the two
//! blob pipelines. Each machine takes an event and produces a new state plus
//! a list of actions to execute.
//!
//! The actual I/O (REST calls, encryption, block transfer) is performed by
//! sft-client, which interprets the actions and reports the outcome back as
//! the next event. Ordering guarantees live here: an upload is never checked
//! in unless every block was committed, and temporary ciphertext is removed
//! only after the step that consumes it succeeded.

use sft_types::BlobId;

/// Upload pipeline - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    /// Nothing started.
    Idle,
    /// Waiting for the liveness probe.
    Probing,
    /// Fetching container key material.
    FetchingKey,
    /// Creating the blob entry.
    CreatingBlob,
    /// Checking the blob out for writing.
    CheckingOut {
        /// Blob being uploaded.
        blob_id: BlobId,
    },
    /// Encrypting the source file to the sibling ciphertext file.
    Encrypting {
        /// Blob being uploaded.
        blob_id: BlobId,
    },
    /// Sending ciphertext blocks and committing the block list.
    Transferring {
        /// Blob being uploaded.
        blob_id: BlobId,
    },
    /// Checking the blob back in.
    CheckingIn {
        /// Blob being uploaded.
        blob_id: BlobId,
    },
    /// Removing the local ciphertext.
    CleaningUp {
        /// Blob that was uploaded.
        blob_id: BlobId,
    },
    /// Upload checked in and local ciphertext removed.
    Complete {
        /// Blob that was uploaded.
        blob_id: BlobId,
    },
    /// Upload stopped.
    Failed {
        /// Stage in which the pipeline stopped.
        stage: &'static str,
    },
}

/// Events that drive the upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// Caller started the upload (input already validated).
    Start,
    /// Liveness probe answered.
    ProbeCompleted {
        /// Whether the service is reachable.
        alive: bool,
    },
    /// Key material fetched.
    KeyFetched,
    /// Blob entry created.
    BlobCreated {
        /// Server-issued ID.
        blob_id: BlobId,
    },
    /// Check-out grant received.
    CheckedOut,
    /// Ciphertext written.
    Encrypted,
    /// Block transfer finished.
    BlocksSent {
        /// Whether every block and the block list were accepted.
        committed: bool,
    },
    /// Check-in call returned.
    CheckedIn {
        /// Whether the server accepted the check-in.
        accepted: bool,
    },
    /// Local ciphertext removed.
    CiphertextRemoved,
    /// The step in progress failed with an error.
    StepFailed,
}

/// Actions to be executed by the client for an upload.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadAction {
    /// Call the liveness probe.
    Probe,
    /// Fetch container key material.
    FetchKey,
    /// Create the blob entry.
    CreateBlob,
    /// Check the blob out.
    CheckOut {
        /// Blob to check out.
        blob_id: BlobId,
    },
    /// Encrypt the source file.
    Encrypt,
    /// Upload the ciphertext in blocks and commit.
    SendBlocks,
    /// Check the blob in with the plaintext length.
    CheckIn {
        /// Blob to check in.
        blob_id: BlobId,
    },
    /// Delete the local ciphertext.
    RemoveCiphertext,
    /// Pipeline finished.
    Finish {
        /// Uploaded blob.
        blob_id: BlobId,
    },
    /// Pipeline stopped without an underlying error.
    Abort(AbortReason),
}

/// Why a pipeline stopped when no step returned an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Liveness probe did not answer OK.
    ServiceUnavailable,
    /// A block or the block list was not accepted by storage.
    BlocksRejected,
    /// The server refused the check-in.
    CheckInRejected,
}

impl UploadState {
    /// Create a new pipeline in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (sft-client)
    /// is responsible for executing the returned actions.
    pub fn on_event(self, event: UploadEvent) -> (Self, Vec<UploadAction>) {
        match (self, event) {
            (Self::Idle, UploadEvent::Start) => (Self::Probing, vec![UploadAction::Probe]),

            (Self::Probing, UploadEvent::ProbeCompleted { alive: true }) => {
                (Self::FetchingKey, vec![UploadAction::FetchKey])
            }
            (Self::Probing, UploadEvent::ProbeCompleted { alive: false }) => (
                Self::Failed { stage: "probe" },
                vec![UploadAction::Abort(AbortReason::ServiceUnavailable)],
            ),

            (Self::FetchingKey, UploadEvent::KeyFetched) => {
                (Self::CreatingBlob, vec![UploadAction::CreateBlob])
            }

            (Self::CreatingBlob, UploadEvent::BlobCreated { blob_id }) => (
                Self::CheckingOut {
                    blob_id: blob_id.clone(),
                },
                vec![UploadAction::CheckOut { blob_id }],
            ),

            (Self::CheckingOut { blob_id }, UploadEvent::CheckedOut) => {
                (Self::Encrypting { blob_id }, vec![UploadAction::Encrypt])
            }

            (Self::Encrypting { blob_id }, UploadEvent::Encrypted) => {
                (Self::Transferring { blob_id }, vec![UploadAction::SendBlocks])
            }

            (Self::Transferring { blob_id }, UploadEvent::BlocksSent { committed: true }) => (
                Self::CheckingIn {
                    blob_id: blob_id.clone(),
                },
                vec![UploadAction::CheckIn { blob_id }],
            ),
            (Self::Transferring { .. }, UploadEvent::BlocksSent { committed: false }) => (
                Self::Failed { stage: "transfer" },
                vec![UploadAction::Abort(AbortReason::BlocksRejected)],
            ),

            (Self::CheckingIn { blob_id }, UploadEvent::CheckedIn { accepted: true }) => {
                (Self::CleaningUp { blob_id }, vec![UploadAction::RemoveCiphertext])
            }
            (Self::CheckingIn { .. }, UploadEvent::CheckedIn { accepted: false }) => (
                Self::Failed { stage: "check-in" },
                vec![UploadAction::Abort(AbortReason::CheckInRejected)],
            ),

            (Self::CleaningUp { blob_id }, UploadEvent::CiphertextRemoved) => (
                Self::Complete {
                    blob_id: blob_id.clone(),
                },
                vec![UploadAction::Finish { blob_id }],
            ),

            (state, UploadEvent::StepFailed) if !state.is_terminal() => (
                Self::Failed {
                    stage: state.stage(),
                },
                vec![],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Short name of the current stage, used in logs and errors.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Probing => "probe",
            Self::FetchingKey => "key",
            Self::CreatingBlob => "create",
            Self::CheckingOut { .. } => "check-out",
            Self::Encrypting { .. } => "encrypt",
            Self::Transferring { .. } => "transfer",
            Self::CheckingIn { .. } => "check-in",
            Self::CleaningUp { .. } => "cleanup",
            Self::Complete { .. } => "complete",
            Self::Failed { stage } => *stage,
        }
    }

    /// Blob ID, once the blob entry exists.
    pub fn blob_id(&self) -> Option<&BlobId> {
        match self {
            Self::CheckingOut { blob_id }
            | Self::Encrypting { blob_id }
            | Self::Transferring { blob_id }
            | Self::CheckingIn { blob_id }
            | Self::CleaningUp { blob_id }
            | Self::Complete { blob_id } => Some(blob_id),
            _ => None,
        }
    }

    /// Check if the pipeline has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }
}

impl Default for UploadState {
    fn default() -> Self {
        Self::new()
    }
}

/// Download pipeline - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    /// Nothing started.
    Idle,
    /// Waiting for the liveness probe.
    Probing,
    /// Fetching container key material.
    FetchingKey,
    /// Requesting the read grant.
    RequestingRead,
    /// Streaming ciphertext to the temporary file.
    Transferring,
    /// Decrypting into the destination.
    Decrypting,
    /// Removing the temporary ciphertext.
    CleaningUp,
    /// Plaintext written and temporary ciphertext removed.
    Complete,
    /// Download stopped.
    Failed {
        /// Stage in which the pipeline stopped.
        stage: &'static str,
    },
}

/// Events that drive the download pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadEvent {
    /// Caller started the download (input already validated).
    Start,
    /// Liveness probe answered.
    ProbeCompleted {
        /// Whether the service is reachable.
        alive: bool,
    },
    /// Key material fetched.
    KeyFetched,
    /// Read grant received.
    ReadGranted,
    /// Ciphertext fully written to the temporary file.
    Transferred,
    /// Plaintext written.
    Decrypted,
    /// Temporary ciphertext removed.
    CiphertextRemoved,
    /// The step in progress failed with an error.
    StepFailed,
}

/// Actions to be executed by the client for a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadAction {
    /// Call the liveness probe.
    Probe,
    /// Fetch container key material.
    FetchKey,
    /// Request the read grant.
    RequestRead,
    /// Stream ciphertext from storage.
    Fetch,
    /// Decrypt the temporary ciphertext.
    Decrypt,
    /// Delete the temporary ciphertext.
    RemoveCiphertext,
    /// Pipeline finished.
    Finish,
    /// Pipeline stopped without an underlying error.
    Abort(AbortReason),
}

impl DownloadState {
    /// Create a new pipeline in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: DownloadEvent) -> (Self, Vec<DownloadAction>) {
        match (self, event) {
            (Self::Idle, DownloadEvent::Start) => (Self::Probing, vec![DownloadAction::Probe]),

            (Self::Probing, DownloadEvent::ProbeCompleted { alive: true }) => {
                (Self::FetchingKey, vec![DownloadAction::FetchKey])
            }
            (Self::Probing, DownloadEvent::ProbeCompleted { alive: false }) => (
                Self::Failed { stage: "probe" },
                vec![DownloadAction::Abort(AbortReason::ServiceUnavailable)],
            ),

            (Self::FetchingKey, DownloadEvent::KeyFetched) => {
                (Self::RequestingRead, vec![DownloadAction::RequestRead])
            }
            (Self::RequestingRead, DownloadEvent::ReadGranted) => {
                (Self::Transferring, vec![DownloadAction::Fetch])
            }
            (Self::Transferring, DownloadEvent::Transferred) => {
                (Self::Decrypting, vec![DownloadAction::Decrypt])
            }
            (Self::Decrypting, DownloadEvent::Decrypted) => {
                (Self::CleaningUp, vec![DownloadAction::RemoveCiphertext])
            }
            (Self::CleaningUp, DownloadEvent::CiphertextRemoved) => {
                (Self::Complete, vec![DownloadAction::Finish])
            }

            (state, DownloadEvent::StepFailed) if !state.is_terminal() => (
                Self::Failed {
                    stage: state.stage(),
                },
                vec![],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Short name of the current stage, used in logs and errors.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Probing => "probe",
            Self::FetchingKey => "key",
            Self::RequestingRead => "read",
            Self::Transferring => "transfer",
            Self::Decrypting => "decrypt",
            Self::CleaningUp => "cleanup",
            Self::Complete => "complete",
            Self::Failed { stage } => *stage,
        }
    }

    /// Check if the pipeline has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed { .. })
    }
}

impl Default for DownloadState {
    fn default() -> Self {
        Self::new()
    }
}
