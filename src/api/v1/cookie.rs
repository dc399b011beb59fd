use crate::application_port::IssuedTokenPair;
use chrono::{DateTime, Utc};
use std::time::Duration;
use warp::http::HeaderValue;
use warp::http::header::SET_COOKIE;
use warp::reply::Response;

pub const ACCESS_COOKIE: &str = "accesstoken";
pub const REFRESH_COOKIE: &str = "refreshtoken";

// Cookie lifetimes are independent of the expiry embedded in each token.
pub const ACCESS_COOKIE_TTL: Duration = Duration::from_secs(15 * 60);
pub const REFRESH_COOKIE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        CookiePolicy { secure }
    }

    pub fn session_cookies(&self, tokens: &IssuedTokenPair, now: DateTime<Utc>) -> [String; 2] {
        [
            self.cookie(ACCESS_COOKIE, &tokens.access_token.0, ACCESS_COOKIE_TTL, now),
            self.cookie(REFRESH_COOKIE, &tokens.refresh_token.0, REFRESH_COOKIE_TTL, now),
        ]
    }

    fn cookie(&self, name: &str, value: &str, ttl: Duration, now: DateTime<Utc>) -> String {
        let expires = now + chrono::Duration::seconds(ttl.as_secs() as i64);
        let mut cookie = format!(
            "{name}={value}; Path=/; Expires={}; Max-Age={}; HttpOnly",
            expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            ttl.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Append both session cookies to `response`.
    pub fn attach(
        &self,
        mut response: Response,
        tokens: &IssuedTokenPair,
    ) -> Result<Response, warp::http::header::InvalidHeaderValue> {
        for cookie in self.session_cookies(tokens, Utc::now()) {
            response
                .headers_mut()
                .append(SET_COOKIE, HeaderValue::from_str(&cookie)?);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_port::{AccessToken, RefreshToken};
    use chrono::TimeZone;
    use warp::Reply;

    fn tokens() -> IssuedTokenPair {
        let now = Utc::now();
        IssuedTokenPair {
            access_token: AccessToken("aaa.bbb.ccc".to_string()),
            refresh_token: RefreshToken("ddd.eee.fff".to_string()),
            access_token_expires_at: now,
            refresh_token_expires_at: now,
        }
    }

    #[test]
    fn cookies_carry_names_lifetimes_and_flags() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let [access, refresh] = CookiePolicy::new(false).session_cookies(&tokens(), now);

        assert_eq!(
            access,
            "accesstoken=aaa.bbb.ccc; Path=/; Expires=Mon, 01 Jan 2024 00:15:00 GMT; Max-Age=900; HttpOnly"
        );
        assert_eq!(
            refresh,
            "refreshtoken=ddd.eee.fff; Path=/; Expires=Wed, 31 Jan 2024 00:00:00 GMT; Max-Age=2592000; HttpOnly"
        );
    }

    #[test]
    fn secure_flag_follows_policy() {
        let now = Utc::now();
        for cookie in CookiePolicy::new(true).session_cookies(&tokens(), now) {
            assert!(cookie.ends_with("; HttpOnly; Secure"));
        }
        for cookie in CookiePolicy::new(false).session_cookies(&tokens(), now) {
            assert!(!cookie.contains("Secure"));
        }
    }

    #[test]
    fn attach_appends_two_headers() {
        let response = CookiePolicy::new(false)
            .attach(warp::reply().into_response(), &tokens())
            .unwrap();

        let cookies: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
    }
}
