use std::collections::HashMap;

use crate::client::ManagementClient;
use crate::error::ResvResult;
use crate::types::{ReservationUpdate, VmRecord};

/// Fraction of capacity used as the floor when a zero reservation cannot
/// be doubled.
const ZERO_RESERVATION_DIVISOR: u64 = 10;

/// Cache of total host CPU capacity, valid for the lifetime of one run.
///
/// VMs sharing a host trigger at most one capacity lookup through the
/// client.
#[derive(Debug, Default)]
pub struct HostCpuCache {
    mhz_by_host: HashMap<String, u64>,
}

impl HostCpuCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity of `host_id` in MHz, fetched through the client on first
    /// use.
    pub async fn total_mhz(
        &mut self,
        client: &dyn ManagementClient,
        host_id: &str,
    ) -> ResvResult<u64> {
        if let Some(mhz) = self.mhz_by_host.get(host_id) {
            return Ok(*mhz);
        }
        let mhz = client.host_cpu_mhz(host_id).await?;
        self.mhz_by_host.insert(host_id.to_string(), mhz);
        Ok(mhz)
    }

    pub fn len(&self) -> usize {
        self.mhz_by_host.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mhz_by_host.is_empty()
    }
}

/// Compute the new reservation values for one VM.
///
/// Doubles the current CPU and memory reservations. A zero reservation
/// cannot be doubled into anything nonzero, so it falls back to a tenth
/// of the relevant capacity instead: total host CPU for the CPU value,
/// configured memory for the memory value, both with truncating division.
/// A capacity reported as zero propagates as a zero reservation.
///
/// The change version is copied from the same snapshot as the reservation
/// fields, keeping the submitted update consistent with what was read.
pub async fn compute_update(
    client: &dyn ManagementClient,
    cache: &mut HostCpuCache,
    vm: &VmRecord,
) -> ResvResult<ReservationUpdate> {
    let mut cpu_mhz = vm.cpu_reservation_mhz * 2;
    if cpu_mhz == 0 {
        cpu_mhz = cache.total_mhz(client, &vm.host_id).await? / ZERO_RESERVATION_DIVISOR;
    }

    let mut memory_mb = vm.memory_reservation_mb * 2;
    if memory_mb == 0 {
        memory_mb = vm.memory_total_mb / ZERO_RESERVATION_DIVISOR;
    }

    Ok(ReservationUpdate {
        cpu_reservation_mhz: cpu_mhz,
        memory_reservation_mb: memory_mb,
        change_version: vm.change_version.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClient;
    use crate::types::PowerState;

    fn vm(cpu_mhz: u64, memory_mb: u64, memory_total_mb: u64) -> VmRecord {
        VmRecord {
            id: "vm-1".to_string(),
            name: "app1".to_string(),
            host_id: "host-1".to_string(),
            power_state: PowerState::PoweredOn,
            cpu_reservation_mhz: cpu_mhz,
            memory_reservation_mb: memory_mb,
            memory_total_mb,
            change_version: "cv-7".to_string(),
            ip_addresses: Vec::new(),
        }
    }

    #[tokio::test]
    async fn nonzero_reservations_are_doubled() {
        let client = MockClient::new().with_host("host-1", 24_000);
        let mut cache = HostCpuCache::new();

        let update = compute_update(&client, &mut cache, &vm(100, 512, 2048))
            .await
            .unwrap();
        assert_eq!(update.cpu_reservation_mhz, 200);
        assert_eq!(update.memory_reservation_mb, 1024);
        assert_eq!(update.change_version, "cv-7");
        // No host lookup needed when nothing was zero.
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn zero_cpu_reservation_falls_back_to_tenth_of_host_capacity() {
        let client = MockClient::new().with_host("host-1", 2_595);
        let mut cache = HostCpuCache::new();

        let update = compute_update(&client, &mut cache, &vm(0, 512, 2048))
            .await
            .unwrap();
        // 2595 / 10, truncated.
        assert_eq!(update.cpu_reservation_mhz, 259);
    }

    #[tokio::test]
    async fn zero_memory_reservation_falls_back_to_tenth_of_configured_memory() {
        let client = MockClient::new().with_host("host-1", 24_000);
        let mut cache = HostCpuCache::new();

        let update = compute_update(&client, &mut cache, &vm(100, 0, 2048))
            .await
            .unwrap();
        assert_eq!(update.memory_reservation_mb, 204);
    }

    #[tokio::test]
    async fn zero_host_capacity_propagates_as_zero_reservation() {
        let client = MockClient::new().with_host("host-1", 0);
        let mut cache = HostCpuCache::new();

        let update = compute_update(&client, &mut cache, &vm(0, 0, 0))
            .await
            .unwrap();
        assert_eq!(update.cpu_reservation_mhz, 0);
        assert_eq!(update.memory_reservation_mb, 0);
    }

    #[tokio::test]
    async fn host_capacity_is_looked_up_once_per_host() {
        let client = MockClient::new().with_host("host-1", 20_000);
        let mut cache = HostCpuCache::new();

        for _ in 0..4 {
            compute_update(&client, &mut cache, &vm(0, 0, 1024))
                .await
                .unwrap();
        }
        assert_eq!(client.host_lookup_count("host-1"), 1);
    }

    #[tokio::test]
    async fn unknown_host_lookup_fails() {
        let client = MockClient::new();
        let mut cache = HostCpuCache::new();

        let err = compute_update(&client, &mut cache, &vm(0, 0, 1024))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::ResvError::Internal { .. }));
    }
}
