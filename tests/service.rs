// tests/service.rs
use lsys_path::{
    CompilerConfig, GenerationError, GenerationRequest, RenderEvent, RenderService, Surface,
    ViewState, preset,
};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(30);

fn setup() -> RenderService {
    RenderService::spawn(CompilerConfig::default(), Surface::new(800.0, 600.0)).unwrap()
}

/// Collects events until `ticket` finishes, returning everything received.
fn wait_for(service: &RenderService, ticket: u64) -> Vec<RenderEvent> {
    let mut seen = Vec::new();
    loop {
        let event = service.events().recv_timeout(TIMEOUT).unwrap();
        let done = event.ticket() == ticket && !matches!(event, RenderEvent::Generating { .. });
        seen.push(event);
        if done {
            return seen;
        }
    }
}

#[test]
fn test_view_updates_before_first_generation_are_noops() {
    let service = setup();
    assert!(service.frame(&ViewState::default()).is_none());
    assert!(service.last_generation().is_none());
}

#[test]
fn test_generation_then_view_update() {
    let service = setup();
    let ticket = service.submit(preset("hilbert").unwrap().request());

    let events = wait_for(&service, ticket);
    assert_eq!(events[0], RenderEvent::Generating { ticket });
    assert!(matches!(
        events.last(),
        Some(RenderEvent::Complete { draw_segments: 255, .. })
    ));

    let frame = service.frame(&ViewState::default()).unwrap();
    // 600 - 2 * 20 padding over a 15 unit tall curve.
    assert!((frame.line_width - 15.0 / 560.0).abs() < 1e-9);

    let zoomed = ViewState {
        zoom: 2.0,
        ..Default::default()
    };
    let frame = service.frame(&zoomed).unwrap();
    assert!((frame.line_width - 15.0 / 1120.0).abs() < 1e-9);
}

#[test]
fn test_refusal_keeps_last_result() {
    let service = setup();
    let ticket = service.submit(preset("dragon").unwrap().request());
    wait_for(&service, ticket);
    let before = service.last_generation().unwrap();

    let ticket = service.submit(GenerationRequest::new("F", "F=FF", 0, 90.0));
    let events = wait_for(&service, ticket);
    assert_eq!(
        events.last(),
        Some(&RenderEvent::Refused {
            ticket,
            error: GenerationError::InvalidIterationCount(0)
        })
    );

    let after = service.last_generation().unwrap();
    assert_eq!(after.draw_segment_count(), before.draw_segment_count());
    assert!(service.frame(&ViewState::default()).is_some());
}

#[test]
fn test_latest_request_always_completes() {
    let service = setup();
    let tickets: Vec<u64> = ["crystal", "bracelet", "koch"]
        .into_iter()
        .map(|key| service.submit(preset(key).unwrap().request()))
        .collect();
    let last = *tickets.last().unwrap();

    let events = wait_for(&service, last);
    let completed: Vec<u64> = events
        .iter()
        .filter(|e| matches!(e, RenderEvent::Complete { .. }))
        .map(RenderEvent::ticket)
        .collect();

    // Superseded tickets may be skipped, but never out of order.
    assert!(completed.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(completed.last(), Some(&last));
    assert_eq!(service.last_generation().unwrap().draw_segment_count(), 256);
}

#[test]
fn test_resize_refits_without_regenerating() {
    let service = setup();
    let ticket = service.submit(preset("koch_snowflake").unwrap().request());
    wait_for(&service, ticket);

    let before = service.frame(&ViewState::default()).unwrap();
    service.resize(Surface::new(1600.0, 1200.0));
    let after = service.frame(&ViewState::default()).unwrap();
    assert!(after.line_width < before.line_width);
    assert!(service.events().try_recv().is_err());
}
