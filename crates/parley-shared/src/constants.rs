/// Application name
pub const APP_NAME: &str = "Parley";

/// Push event carrying a freshly stored message addressed to us
pub const EVENT_NEW_MESSAGE: &str = "newMessage";

/// Push event we emit after a successful send
pub const EVENT_SEND_MESSAGE: &str = "sendMessage";

/// Push event carrying the ids of every currently connected user
pub const EVENT_ONLINE_USERS: &str = "getOnlineUsers";

/// History API: peer list plus unseen counts
pub const ROUTE_CONVERSATIONS: &str = "/conversations";

/// Default HTTP header carrying the session token
pub const DEFAULT_AUTH_HEADER: &str = "token";

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Default history API base URL for local development
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// History API: ordered messages exchanged with `peer_id`
pub fn messages_route(peer_id: &str) -> String {
    format!("{ROUTE_CONVERSATIONS}/{peer_id}/messages")
}

/// History API: mark a single message as seen
pub fn seen_route(message_id: &str) -> String {
    format!("/messages/{message_id}/seen")
}
