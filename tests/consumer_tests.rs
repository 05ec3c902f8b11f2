//! Integration tests for the OpenLCB DCC accessory event consumer.

use std::sync::Arc;

use rs_turnouts::events::{
    accessory_event, ACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE, DCC_ACCESSORY_EVENT_COUNT,
    INACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE,
};
use rs_turnouts::hal::{MockEventSink, MockScheduler, MockStorage};
use rs_turnouts::{
    AccessoryEventConsumer, EventId, EventState, TurnoutConfig, TurnoutError, TurnoutRegistry,
    TurnoutStatus,
};

type Registry = TurnoutRegistry<MockStorage, MockEventSink, MockScheduler>;

fn setup() -> (Arc<Registry>, AccessoryEventConsumer<MockStorage, MockEventSink, MockScheduler>) {
    let registry = Arc::new(TurnoutRegistry::new(
        TurnoutConfig::default(),
        MockStorage::new(),
        MockEventSink::new(),
        MockScheduler::new(),
    ));
    let consumer = AccessoryEventConsumer::new(Arc::clone(&registry));
    (registry, consumer)
}

#[test]
fn activate_event_commands_turnout() {
    let (registry, consumer) = setup();
    registry.create_or_update_dcc(10, None, None).unwrap();

    let result = consumer.handle_event_report(accessory_event(10, true, true));

    assert_eq!(result, Some(Ok(TurnoutStatus { id: 10, thrown: true })));
    assert_eq!(registry.scheduler().notifications(), vec![(10, 1)]);
}

#[test]
fn inactivate_event_is_passive() {
    let (registry, consumer) = setup();
    registry.create_or_update_dcc(10, None, None).unwrap();

    consumer.handle_event_report(accessory_event(10, true, false));

    assert!(registry.get(10).unwrap().is_thrown());
    assert!(registry.scheduler().notifications().is_empty());
}

#[test]
fn foreign_events_are_ignored() {
    let (registry, consumer) = setup();
    registry.create_or_update_dcc(1, None, None).unwrap();
    assert_eq!(registry.persist(), Ok(true));

    assert_eq!(consumer.handle_event_report(EventId(0x0501_0101_2200_0000)), None);
    assert_eq!(consumer.identify_consumer(EventId(0x0501_0101_2200_0000)), None);
    assert!(!registry.is_dirty());
}

#[test]
fn event_for_unknown_turnout_fails() {
    let (_registry, consumer) = setup();
    assert_eq!(
        consumer.handle_event_report(accessory_event(99, false, true)),
        Some(Err(TurnoutError::NotFound(99)))
    );
}

#[test]
fn identify_consumer_reflects_state() {
    let (registry, consumer) = setup();
    registry.create_or_update_dcc(10, None, None).unwrap();

    assert_eq!(
        consumer.identify_consumer(accessory_event(10, false, true)),
        Some(EventState::Valid)
    );
    assert_eq!(
        consumer.identify_consumer(accessory_event(10, true, true)),
        Some(EventState::Invalid)
    );

    registry.set(10, true, false).unwrap();
    assert_eq!(
        consumer.identify_consumer(accessory_event(10, true, false)),
        Some(EventState::Valid)
    );
    assert_eq!(
        consumer.identify_consumer(accessory_event(11, true, true)),
        Some(EventState::Unknown)
    );
}

#[test]
fn consumed_ranges_cover_both_bases() {
    let (_registry, consumer) = setup();
    let ranges = consumer.consumed_ranges();

    assert_eq!(ranges[0].base.value(), ACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE);
    assert_eq!(ranges[1].base.value(), INACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE);
    assert!(ranges.iter().all(|range| range.count == DCC_ACCESSORY_EVENT_COUNT));
    assert!(ranges[0].contains(accessory_event(2044, true, true)));
    assert!(!ranges[0].contains(accessory_event(1, false, false)));
    assert!(ranges[1].contains(accessory_event(1, false, false)));
}
