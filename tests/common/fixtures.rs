use notification_store::Notification;

pub const BASE_SENT_AT: i64 = 1_700_000_000;

/// A notification nobody has looked at yet.
pub fn unseen(id: &str, position: usize) -> Notification {
    Notification::new(id, format!("Notification {}", id), BASE_SENT_AT - position as i64)
}

/// Seen but not read.
pub fn seen(id: &str, position: usize) -> Notification {
    let mut n = unseen(id, position);
    n.seen_at = Some(BASE_SENT_AT);
    n
}

pub fn read(id: &str, position: usize) -> Notification {
    let mut n = seen(id, position);
    n.read_at = Some(BASE_SENT_AT);
    n
}

/// `count` notifications `n0..`, newest first. The first `unread` are unread
/// and the first `unseen` of those are also unseen.
pub fn dataset(count: usize, unread: usize, unseen_count: usize) -> Vec<Notification> {
    assert!(unseen_count <= unread && unread <= count);
    (0..count)
        .map(|i| {
            let id = format!("n{}", i);
            if i < unseen_count {
                unseen(&id, i)
            } else if i < unread {
                seen(&id, i)
            } else {
                read(&id, i)
            }
        })
        .collect()
}

pub fn ids(notifications: &[Notification]) -> Vec<String> {
    notifications.iter().map(|n| n.id.clone()).collect()
}
