use redis::AsyncCommands;

use dukkan_cart::Cart;
use dukkan_order::CheckoutAttempt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Carts and in-flight checkout attempts live in Redis, keyed by the
/// customer's session. Both are JSON blobs with a sliding TTL.
#[derive(Clone)]
pub struct SessionStore {
    client: redis::Client,
}

const CART_TTL_SECS: u64 = 7 * 24 * 3600;
const ATTEMPT_TTL_SECS: u64 = 24 * 3600;

impl SessionStore {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    fn cart_key(session: &str) -> String {
        format!("cart:{}", session)
    }

    fn attempt_key(session: &str) -> String {
        format!("checkout:{}", session)
    }

    /// Load the session's cart. Missing or unreadable state yields an empty
    /// cart rather than an error; a customer with a corrupt cart blob should
    /// see an empty cart, not a 500.
    pub async fn load_cart(&self, session: &str) -> Result<Cart, BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(Self::cart_key(session)).await?;
        match raw {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(cart) => Ok(cart),
                Err(err) => {
                    tracing::warn!(session, error = %err, "discarding unreadable cart blob");
                    Ok(Cart::new())
                }
            },
            None => Ok(Cart::new()),
        }
    }

    pub async fn save_cart(&self, session: &str, cart: &Cart) -> Result<(), BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw = serde_json::to_string(cart)?;
        conn.set_ex::<_, _, ()>(Self::cart_key(session), raw, CART_TTL_SECS)
            .await?;
        Ok(())
    }

    pub async fn clear_cart(&self, session: &str) -> Result<(), BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(Self::cart_key(session)).await?;
        Ok(())
    }

    pub async fn load_attempt(&self, session: &str) -> Result<Option<CheckoutAttempt>, BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(Self::attempt_key(session)).await?;
        match raw {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(attempt) => Ok(Some(attempt)),
                Err(err) => {
                    tracing::warn!(session, error = %err, "discarding unreadable checkout attempt");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub async fn save_attempt(&self, session: &str, attempt: &CheckoutAttempt) -> Result<(), BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw = serde_json::to_string(attempt)?;
        conn.set_ex::<_, _, ()>(Self::attempt_key(session), raw, ATTEMPT_TTL_SECS)
            .await?;
        Ok(())
    }

    pub async fn clear_attempt(&self, session: &str) -> Result<(), BoxError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(Self::attempt_key(session)).await?;
        Ok(())
    }

    /// Sliding-window request counter. Callers fail open on Redis errors.
    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> Result<bool, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}
