use std::sync::atomic::{
    AtomicI64,
    Ordering,
};

static NOW: AtomicI64 = AtomicI64::new(1234567890);

/// Stand-in for `chrono::Utc` whose clock starts at a fixed timestamp
/// and advances by one second on every reading.
pub struct Utc;

impl Utc {
    pub fn now() -> ::chrono::DateTime<::chrono::Utc> {
        let ts = NOW.fetch_add(1, Ordering::SeqCst);
        ::chrono::DateTime::from_timestamp(ts, 0)
            .expect("mock timestamp out of range")
    }
}

#[cfg(test)]
mod test {
    use super::Utc;

    #[test]
    fn monotonic() {
        let first = Utc::now().timestamp();
        let second = Utc::now().timestamp();
        assert!(first >= 1234567890);
        assert!(second > first);
    }
}
