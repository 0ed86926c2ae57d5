use jobboard_types::models::ApplicationStatus;

/// A notice to be rendered and delivered by the mail collaborator. Template
/// content is the mailer's business; the core only names the template and
/// hands over its arguments.
#[derive(Debug, Clone)]
pub enum Notice {
    Welcome {
        name: String,
    },
    PasswordReset {
        reset_url: String,
    },
    /// Confirmation to the candidate that their application went in.
    ApplicationReceived {
        job_title: String,
        company: String,
    },
    /// Heads-up to the employer that a candidate applied.
    NewApplication {
        job_title: String,
        candidate_name: String,
    },
    ApplicationStatusChanged {
        job_title: String,
        status: ApplicationStatus,
    },
}

impl Notice {
    pub fn template(&self) -> &'static str {
        match self {
            Notice::Welcome { .. } => "welcome",
            Notice::PasswordReset { .. } => "password-reset",
            Notice::ApplicationReceived { .. } => "application-received",
            Notice::NewApplication { .. } => "new-application",
            Notice::ApplicationStatusChanged { .. } => "application-status",
        }
    }
}

/// Best-effort outbound notifications. Implementations must not block the
/// caller and must swallow their own delivery failures (logging them); a
/// failed send never fails the operation that triggered it.
pub trait Notifier: Send + Sync {
    fn send(&self, to: &str, notice: Notice);
}

/// Drops every notice. For tests and mail-less deployments.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn send(&self, _to: &str, _notice: Notice) {}
}
