use std::time::Duration;

use crate::error::Error;

pub(crate) fn record_ok(netfn: u8, cmd: u8, elapsed: Duration, completion_code: u8) {
    #[cfg(feature = "metrics")]
    {
        metrics::counter!("bmc_hal_requests_total", "outcome" => "ok").increment(1);
        metrics::histogram!("bmc_hal_request_seconds").record(elapsed.as_secs_f64());
        if completion_code != 0x00 {
            metrics::counter!("bmc_hal_completion_code_nonzero_total").increment(1);
        }
    }

    tracing::debug!(
        netfn,
        cmd,
        completion_code,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "ipmi request ok"
    );
}

pub(crate) fn record_err(netfn: u8, cmd: u8, elapsed: Duration, err: &Error) {
    #[cfg(feature = "metrics")]
    {
        metrics::counter!("bmc_hal_requests_total", "outcome" => "err").increment(1);
        metrics::counter!("bmc_hal_request_errors_total", "kind" => err.kind()).increment(1);
        metrics::histogram!("bmc_hal_request_seconds").record(elapsed.as_secs_f64());
    }

    tracing::warn!(
        netfn,
        cmd,
        kind = err.kind(),
        error = %err,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "ipmi request failed"
    );
}
