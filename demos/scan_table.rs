//! Pairing-mode scan tables
//!
//! Replays three advertisement streams through a registry and prints the
//! tracked devices by recency and by signal strength, with the time since
//! each was last seen.
//!
//! Run with: cargo run --example scan_table

use std::thread;
use std::time::Duration;

use tinyscan::prelude::*;
use tinyscan::record::WIRE_LEN;

/// Feeds one raw event the way the wireless stack would hand it over
fn on_discovery(registry: &mut DeviceRegistry<32>, raw: &[u8], clock: &SystemClock) {
    match AdvertisementRecord::from_bytes(raw) {
        Ok(record) => {
            registry.observe_with(&record, clock);
        }
        Err(err) => eprintln!("   bad advertisement: {err}"),
    }
}

fn event(device_id: u32, rssi: u8) -> [u8; WIRE_LEN] {
    let name = format!("proprietary_{device_id:02}");
    AdvertisementRecord::new(device_id)
        .with_name(name.as_bytes())
        .with_signal_strength(rssi)
        .to_bytes()
}

fn print_row(device: &TrackedDevice, now: u64) {
    println!(
        "   {:>6}  {:<16}  {:>4}  {:>6} ms",
        device.device_id(),
        device.record.name_str().unwrap_or("?"),
        device.signal_strength(),
        device.age_ms(now)
    );
}

fn print_tables(registry: &DeviceRegistry<32>, clock: &SystemClock) {
    let now = clock.now_ms();

    println!("   Devices ordered by time:");
    println!("   {:>6}  {:<16}  {:>4}  {:>9}", "dev", "name", "rssi", "age");
    for device in registry.snapshot_by_recency() {
        print_row(device, now);
    }

    println!("   Devices ordered by RSSI (descending):");
    for device in registry.snapshot_by_signal_strength() {
        print_row(device, now);
    }
}

fn main() {
    println!("=== Pairing Scan Tables ===\n");

    let clock = SystemClock;
    let mut registry = DeviceRegistry::<32>::new();
    let pause = Duration::from_millis(5);

    // === Fill past capacity ===
    println!("1. 64 devices into 32 slots:");
    let mut rssi: u8 = 1;
    for id in 1..=64 {
        on_discovery(&mut registry, &event(id, rssi), &clock);
        thread::sleep(pause);
        rssi = rssi.wrapping_add(21);
    }
    print_tables(&registry, &clock);
    println!("   {}", registry.pool_diagnostics());
    registry.clear();

    // === Same five devices, three rounds ===
    println!("\n2. Five devices repeating:");
    for round in 1..=3 {
        for id in 1..=5 {
            on_discovery(&mut registry, &event(id, rssi), &clock);
            thread::sleep(pause);
            rssi = rssi.wrapping_add(21);
        }
        println!("   Round {round}: {} tracked", registry.len());
    }
    print_tables(&registry, &clock);
    for block in registry.pool_blocks().filter(|block| block.in_use) {
        println!("   {block}");
    }
    registry.clear();

    // === Recurring devices among uniques ===
    println!("\n3. Recurring devices among 32 uniques:");
    for id in 6..=37 {
        on_discovery(&mut registry, &event(id, rssi), &clock);
        thread::sleep(pause);
        rssi = rssi.wrapping_add(21);
    }
    for _ in 1..=7 {
        for id in 1..=5 {
            on_discovery(&mut registry, &event(id, rssi), &clock);
            thread::sleep(pause);
            rssi = rssi.wrapping_add(21);
        }
    }
    print_tables(&registry, &clock);
    registry.clear();

    println!("\n   {}", registry.pool_diagnostics());
}
