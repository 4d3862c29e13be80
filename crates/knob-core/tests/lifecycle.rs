//! End-to-end coordinator scenarios: boot, network hand-off, access-point setup.

mod common;

use common::{Call, Harness};
use knob_core::collaborators::{RUNNING_RAINBOW_SPEED, flashes};
use knob_core::network::NetworkState;
use knob_core::{CoreConfig, EventKind, SystemState};

fn count(calls: &[Call], wanted: &Call) -> usize {
    calls.iter().filter(|call| *call == wanted).count()
}

#[test]
fn test_boot_with_wifi_reaches_running() {
    let mut h = Harness::new(CoreConfig::default());

    h.run_until(3950, 50);
    assert_eq!(h.coordinator.state(), SystemState::Booting);
    assert!(h.take_calls().is_empty());

    h.tick_at(4000);
    assert_eq!(h.coordinator.state(), SystemState::Initializing);
    let calls = h.take_calls();
    assert_eq!(calls, [Call::NetworkInit, Call::App(EventKind::BootingComplete)]);
    let ui = h.ui_events();
    assert_eq!(ui.len(), 1);
    assert_eq!(ui[0].kind(), EventKind::DisplayWifiConnecting);

    h.network.set(NetworkState::Connecting);
    h.tick_at(4050);
    assert_eq!(h.coordinator.state(), SystemState::WifiConnecting);
    assert_eq!(
        h.take_calls(),
        [Call::Loading(true), Call::App(EventKind::WifiConnecting)]
    );

    // Staying in Connecting is not a change.
    h.run_until(6000, 50);
    assert_eq!(h.coordinator.state(), SystemState::WifiConnecting);
    assert!(h.take_calls().is_empty());

    h.network.set(NetworkState::Connected);
    h.tick_at(6050);
    assert!(matches!(
        h.coordinator.state(),
        SystemState::Ready | SystemState::Running
    ));
    h.tick_at(6100);
    assert_eq!(h.coordinator.state(), SystemState::Running);

    let calls = h.take_calls();
    assert_eq!(
        calls,
        [
            Call::Loading(false),
            Call::Flash(flashes::WIFI_CONNECTED),
            Call::App(EventKind::WifiConnected),
            Call::Rainbow(true, RUNNING_RAINBOW_SPEED),
        ]
    );
    assert_eq!(
        h.ui_events().iter().map(|e| e.kind()).collect::<Vec<_>>(),
        [EventKind::DisplayHome]
    );

    h.run_until(20_000, 50);
    assert_eq!(h.coordinator.state(), SystemState::Running);
    let later = h.take_calls();
    assert_eq!(count(&later, &Call::App(EventKind::BootingComplete)), 0);
    assert_eq!(count(&later, &Call::App(EventKind::WifiConnected)), 0);
}

#[test]
fn test_boot_without_wifi_wakes_display() {
    let config = CoreConfig {
        wifi_required: false,
        ..CoreConfig::default()
    };
    let mut h = Harness::new(config);

    h.run_until(4000, 50);
    assert_eq!(h.coordinator.state(), SystemState::Running);

    let calls = h.take_calls();
    assert_eq!(count(&calls, &Call::NetworkInit), 0);
    assert_eq!(count(&calls, &Call::App(EventKind::BootingComplete)), 1);
    assert_eq!(
        h.ui_events().iter().map(|e| e.kind()).collect::<Vec<_>>(),
        [EventKind::DisplayWakeUp]
    );
}

#[test]
fn test_missing_credentials_fall_back_to_access_point() {
    let mut h = Harness::new(CoreConfig::default());
    h.run_until(4000, 50);
    h.take_calls();
    h.ui_events();

    h.network.set(NetworkState::CredentialNotFound);
    h.tick_at(4050);
    assert_eq!(
        h.take_calls(),
        [Call::App(EventKind::WifiDisconnected), Call::SetupAp]
    );

    h.tick_at(4100);
    assert_eq!(h.coordinator.state(), SystemState::WifiApMode);
    assert_eq!(
        h.take_calls(),
        [Call::WebInit, Call::Flash(flashes::AP_MODE)]
    );
    let ui = h.ui_events();
    assert_eq!(ui.len(), 1);
    assert_eq!(ui[0].kind(), EventKind::DisplayWifiApMode);
    assert_eq!(ui[0].text(), Some("knob-setup|192.168.4.1"));

    // The portal is serviced every tick while in AP mode.
    let before = h.web_updates.get();
    h.run_until(4300, 50);
    assert_eq!(h.web_updates.get(), before + 4);
    assert!(h.ui_events().is_empty());

    // Never auto-starts from AP mode.
    assert_eq!(h.coordinator.state(), SystemState::WifiApMode);
}

#[test]
fn test_setup_url_sent_once_per_client_arrival() {
    let mut h = Harness::new(CoreConfig::default());
    h.run_until(4000, 50);
    h.network.set(NetworkState::Timeout);
    h.run_until(4100, 50);
    h.take_calls();
    h.ui_events();

    h.ap_client.set(true);
    h.tick_at(4150);
    let ui = h.ui_events();
    assert_eq!(ui.len(), 1);
    assert_eq!(ui[0].kind(), EventKind::DisplayWifiSetupUrl);
    assert_eq!(ui[0].text(), Some("http://192.168.4.1/setup"));
    assert_eq!(h.take_calls(), [Call::Flash(flashes::SETUP_CLIENT)]);

    // Client stays connected: nothing more.
    h.run_until(6000, 50);
    assert!(h.ui_events().is_empty());

    // Leaves and comes back: announced again.
    h.ap_client.set(false);
    h.tick_at(6050);
    h.ap_client.set(true);
    h.tick_at(6100);
    let ui = h.ui_events();
    assert_eq!(ui.len(), 1);
    assert_eq!(ui[0].kind(), EventKind::DisplayWifiSetupUrl);
}

#[test]
fn test_connection_loss_after_running_enters_setup() {
    let mut h = Harness::new(CoreConfig::default());
    h.run_until(4000, 50);
    h.network.set(NetworkState::Connecting);
    h.tick_at(4050);
    h.network.set(NetworkState::Connected);
    h.run_until(4150, 50);
    assert_eq!(h.coordinator.state(), SystemState::Running);
    h.take_calls();

    h.network.set(NetworkState::Error);
    h.run_until(4250, 50);
    assert_eq!(h.coordinator.state(), SystemState::WifiApMode);
    let calls = h.take_calls();
    assert_eq!(count(&calls, &Call::App(EventKind::WifiDisconnected)), 1);
    assert_eq!(count(&calls, &Call::SetupAp), 1);
}

#[test]
fn test_health_report_tracks_uptime_and_cycles() {
    let config = CoreConfig {
        wifi_required: false,
        ..CoreConfig::default()
    };
    let mut h = Harness::new(config);
    h.run_until(10_000, 50);

    let report = h.coordinator.health_report();
    assert_eq!(report.state, SystemState::Running);
    assert_eq!(report.uptime_ms, 10_000);
    assert_eq!(report.coordination_cycles, 200);
    assert_eq!(report.free_heap, None);
}
