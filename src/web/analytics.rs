// Best-effort feature-usage pings.
//
// Pings run on detached threads and every failure is swallowed: no network,
// no retries, no user impact. The external IP is looked up once, lazily, on
// the first ping so server startup never blocks on it.

use serde_json::json;

pub const FEATURE_ANALYTICS_URL: &str = "https://api.mldemo.app/feature-analytics/";
pub const IP_ECHO_URL: &str = "https://api.ipify.org";

const NO_CONNECTION: &str = "No internet connection";

lazy_static::lazy_static! {
    static ref IP_ADDRESS: String = external_ip();
}

/// The machine's external IP as seen by the echo service, or a sentinel when
/// offline.
pub fn external_ip() -> String {
    ureq::get(IP_ECHO_URL)
        .call()
        .ok()
        .and_then(|response| response.into_string().ok())
        .unwrap_or_else(|| NO_CONNECTION.to_string())
}

/// Fire-and-forget usage ping. Returns immediately; the post happens on its
/// own thread and errors are dropped.
pub fn ping_feature(feature: &'static str) {
    std::thread::spawn(move || {
        let payload = json!({
            "ip_address": *IP_ADDRESS,
            "feature": feature,
        });
        let _ = ureq::post(FEATURE_ANALYTICS_URL).send_json(payload);
    });
}
