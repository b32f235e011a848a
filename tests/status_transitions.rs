use tienda_admin_api::models::OrderStatus;

#[test]
fn pending_moves_to_paid_or_cancelled() {
    assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
    assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
    assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
    assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
}

#[test]
fn paid_moves_to_shipped_or_cancelled() {
    assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Shipped));
    assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
    assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Pending));
    assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Delivered));
}

#[test]
fn shipped_only_moves_to_delivered() {
    assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Paid));
}

#[test]
fn delivered_and_cancelled_are_terminal() {
    for next in [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ] {
        assert!(!OrderStatus::Delivered.can_transition_to(next));
        assert!(!OrderStatus::Cancelled.can_transition_to(next));
    }
}

#[test]
fn no_status_transitions_to_itself() {
    for status in [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ] {
        assert!(!status.can_transition_to(status));
    }
}

#[test]
fn parse_round_trips_known_statuses() {
    for status in [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ] {
        assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(OrderStatus::parse("refunded"), None);
    assert_eq!(OrderStatus::parse("Pending"), None);
}
