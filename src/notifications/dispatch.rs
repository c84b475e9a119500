//! Fire-and-forget notification dispatch.
//!
//! Notifications run on a detached task after the success response is
//! determined. A failed or panicked delivery is contained here and logged;
//! it never reaches the request path.

use std::sync::Arc;

use crate::notifications::mailer::{Mailer, OutboundEmail};
use crate::observability::metrics;

/// Queue one email for delivery off the request path.
pub fn dispatch(mailer: Arc<dyn Mailer>, email: OutboundEmail) {
    tokio::spawn(async move {
        let to = email.to.clone();
        let subject = email.subject.clone();
        match mailer.send(email).await {
            Ok(id) => {
                tracing::debug!(to = %to, subject = %subject, provider_id = %id, "Notification delivered");
                metrics::record_notification("delivered");
            }
            Err(e) => {
                tracing::error!(to = %to, subject = %subject, error = %e, "Notification delivery failed");
                metrics::record_notification("failed");
            }
        }
    });
}
