//! Session cookie construction on top of the `cookie` crate.

use cookie::{Cookie, CookieJar};
use time::{Duration, OffsetDateTime};

use crate::config::SessionConfig;

/// Builds a jar from a raw `Cookie` request header. Unparsable pairs are
/// skipped.
pub fn jar_from_header(header: &str) -> CookieJar {
    let mut jar = CookieJar::new();
    for cookie in Cookie::split_parse(header).flatten() {
        jar.add_original(cookie.into_owned());
    }
    jar
}

/// Reads the session id from the inbound jar. An empty value counts as
/// absent.
pub(crate) fn session_id(jar: &CookieJar, config: &SessionConfig) -> Option<String> {
    jar.get(&config.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Create session cookie. `expires` is `None` for browser-session cookies.
pub(crate) fn session_cookie(
    config: &SessionConfig,
    session_id: &str,
    expires: Option<OffsetDateTime>,
) -> Cookie<'static> {
    let mut builder = Cookie::build((config.cookie_name.clone(), session_id.to_string()))
        .http_only(config.cookie_http_only)
        .secure(config.cookie_secure)
        .same_site(config.cookie_same_site)
        .path(config.cookie_path.clone());

    if let Some(domain) = &config.cookie_domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(expires) = expires {
        builder = builder.expires(expires);
    }

    builder.build()
}

/// Create removal cookie for the session, on the same domain and path it was
/// issued with.
pub(crate) fn clear_session_cookie(config: &SessionConfig) -> Cookie<'static> {
    let mut builder = Cookie::build((config.cookie_name.clone(), ""))
        .http_only(config.cookie_http_only)
        .secure(config.cookie_secure)
        .same_site(config.cookie_same_site)
        .path(config.cookie_path.clone())
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH);

    if let Some(domain) = &config.cookie_domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use cookie::SameSite;

    use super::*;

    #[test]
    fn test_jar_from_header() {
        let jar = jar_from_header("session=abc; theme=dark");
        assert_eq!(jar.get("session").map(|c| c.value()), Some("abc"));
        assert_eq!(jar.get("theme").map(|c| c.value()), Some("dark"));
        assert_eq!(jar.delta().count(), 0);
    }

    #[test]
    fn test_empty_session_id_is_absent() {
        let config = SessionConfig::default();
        let jar = jar_from_header("session=");
        assert_eq!(session_id(&jar, &config), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = SessionConfig::default()
            .with_cookie_name("sid")
            .with_cookie_domain("example.com")
            .with_cookie_path("/app")
            .with_secure(true);
        let expires = OffsetDateTime::UNIX_EPOCH + Duration::days(20_000);

        let cookie = session_cookie(&config, "token", Some(expires));
        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), "token");
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/app"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.expires_datetime(), Some(expires));
    }

    #[test]
    fn test_browser_session_cookie_has_no_expiry() {
        let cookie = session_cookie(&SessionConfig::default(), "token", None);
        assert!(cookie.expires().is_none());
        assert!(cookie.max_age().is_none());
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let config = SessionConfig::default().with_cookie_domain("example.com");
        let cookie = clear_session_cookie(&config);
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
    }
}
