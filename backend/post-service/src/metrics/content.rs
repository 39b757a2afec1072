use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Successful post mutations (create/update/delete).
    pub static ref POSTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_service_posts_total",
        "Successful post mutations segmented by operation",
        &["op"]
    )
    .expect("failed to register post_service_posts_total");

    /// Successful comment mutations (create/update/delete).
    pub static ref COMMENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_service_comments_total",
        "Successful comment mutations segmented by operation",
        &["op"]
    )
    .expect("failed to register post_service_comments_total");

    /// Like transitions by target (post/comment) and op (like/unlike).
    pub static ref LIKES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_service_likes_total",
        "Like and unlike transitions segmented by target",
        &["target", "op"]
    )
    .expect("failed to register post_service_likes_total");

    /// Compensating deletes after a failed comment attach.
    pub static ref COMMENT_ROLLBACKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_service_comment_rollbacks_total",
        "Comment rollbacks segmented by outcome",
        &["result"]
    )
    .expect("failed to register post_service_comment_rollbacks_total");
}

pub fn record_post_op(op: &str) {
    POSTS_TOTAL.with_label_values(&[op]).inc();
}

pub fn record_comment_op(op: &str) {
    COMMENTS_TOTAL.with_label_values(&[op]).inc();
}

pub fn record_like(target: &str, op: &str) {
    LIKES_TOTAL.with_label_values(&[target, op]).inc();
}

pub fn record_comment_rollback(result: &str) {
    COMMENT_ROLLBACKS_TOTAL.with_label_values(&[result]).inc();
}
