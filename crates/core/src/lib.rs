pub mod config;
pub mod credentials;
pub mod fetcher;
pub mod orchestrator;
pub mod testing;
pub mod uploader;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, CredentialConfig, SanitizedConfig,
};
pub use credentials::{
    acquire_storage_credential, create_credential_provider, AccessToken, AuthError,
    CredentialProvider,
};
pub use fetcher::{DownloadRequest, FetchError, FetchResult, Fetcher, YtDlpFetcher};
pub use orchestrator::{
    InvocationMode, JobError, JobHandle, JobOrchestrator, JobOutcome, JobReport, JobStage,
    JobState, OrchestratorConfig, OrchestratorStatus, ResponseFormat,
};
pub use uploader::{DriveUploader, UploadError, UploadJob, UploadResult, Uploader};
