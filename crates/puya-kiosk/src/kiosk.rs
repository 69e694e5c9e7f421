//! Non-interactive kiosk loop: capture → dedupe → lookup → render.

use std::io::Write;

use puya_lookup::{CaptureError, IdentifierSource, LookupOutcome, OdooClient, RpcTransport};

use crate::render::{render, OutputFormat};
use crate::session::KioskSession;
use crate::types::KioskResult;

/// Look up one identifier, record it in the session and write the rendering.
pub async fn lookup_and_render<T, W>(
    identifier: &str,
    client: &OdooClient<T>,
    session: &mut KioskSession,
    format: OutputFormat,
    out: &mut W,
) -> KioskResult<LookupOutcome>
where
    T: RpcTransport,
    W: Write,
{
    let outcome = client.lookup_product(identifier).await;
    session.record(&outcome);
    writeln!(out, "{}", render(&outcome, format)?)?;
    if format == OutputFormat::Text {
        writeln!(out)?;
    }
    out.flush()?;
    Ok(outcome)
}

/// Drain `source` until it closes. Repeat captures of the same code are skipped.
pub async fn run<S, T, W>(
    source: &mut S,
    client: &OdooClient<T>,
    session: &mut KioskSession,
    format: OutputFormat,
    out: &mut W,
) -> KioskResult<()>
where
    S: IdentifierSource + ?Sized,
    T: RpcTransport,
    W: Write,
{
    tracing::info!("Kiosk loop started");

    loop {
        let identifier = match source.capture() {
            Ok(Some(identifier)) => identifier,
            Ok(None) => continue,
            Err(CaptureError::Closed) => {
                tracing::info!("Capture source closed, shutting down");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if !session.observe(&identifier) {
            continue;
        }

        lookup_and_render(&identifier, client, session, format, out).await?;
    }

    Ok(())
}
