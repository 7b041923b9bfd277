pub mod deny_submission;
