//! Outbound mail via an HTTP relay. Notices are queued on an unbounded
//! channel and delivered by a background task, so a slow or dead relay can
//! never stall a request handler.

use serde_json::json;
use tokio::sync::mpsc;
use tracing::warn;

use jobboard_core::notify::{Notice, Notifier};

struct Outbound {
    to: String,
    template: &'static str,
    data: serde_json::Value,
}

pub struct Mailer {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Mailer {
    /// Spawn the delivery task. Must be called from within a tokio runtime.
    pub fn spawn(mail_url: String, from: String) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

        tokio::spawn(async move {
            let client = reqwest::Client::new();
            while let Some(mail) = rx.recv().await {
                let body = json!({
                    "from": from,
                    "to": mail.to,
                    "template": mail.template,
                    "data": mail.data,
                });
                match client.post(&mail_url).json(&body).send().await {
                    Ok(resp) if !resp.status().is_success() => {
                        warn!("mail relay returned {} for template '{}'", resp.status(), mail.template);
                    }
                    Err(e) => warn!("mail relay send failed: {}", e),
                    Ok(_) => {}
                }
            }
        });

        Self { tx }
    }
}

impl Notifier for Mailer {
    fn send(&self, to: &str, notice: Notice) {
        let outbound = Outbound {
            to: to.to_string(),
            template: notice.template(),
            data: template_data(&notice),
        };
        if self.tx.send(outbound).is_err() {
            warn!("mail worker gone; dropping notice '{}'", notice.template());
        }
    }
}

fn template_data(notice: &Notice) -> serde_json::Value {
    match notice {
        Notice::Welcome { name } => json!({ "name": name }),
        Notice::PasswordReset { reset_url } => json!({ "resetUrl": reset_url }),
        Notice::ApplicationReceived { job_title, company } => {
            json!({ "jobTitle": job_title, "company": company })
        }
        Notice::NewApplication { job_title, candidate_name } => {
            json!({ "jobTitle": job_title, "candidateName": candidate_name })
        }
        Notice::ApplicationStatusChanged { job_title, status } => {
            json!({ "jobTitle": job_title, "status": status.as_str() })
        }
    }
}
