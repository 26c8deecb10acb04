//! Record-level entry points for a declarative host.
//!
//! The host hands in flat [`Record`]s and gets flat records back; the
//! conversion to and from [`IpamReservation`] lives in [`ipam::binding`].

use ipam::binding::{bind_reservation, changed_fields, reservation_from_record, reservation_id};
use ipam::{ApiTransport, IpamError, IpamReservation, Record};
use tracing::info;

use crate::operations::IpamClient;

/// Create, read, update, and delete of one reservation expressed on records.
pub struct ReservationResource<'a, T> {
    client: &'a IpamClient<T>,
}

impl<'a, T: ApiTransport> ReservationResource<'a, T> {
    pub fn new(client: &'a IpamClient<T>) -> Self {
        Self { client }
    }

    /// Creates the reservation described by `desired`.
    ///
    /// Returns `desired` with every server-computed field filled in.
    pub async fn create(&self, desired: &Record) -> Result<Record, IpamError> {
        let reservation = reservation_from_record(desired)?;
        let created = self.client.create_reservation(reservation).await?;
        bound(desired, &created.object)
    }

    /// Refreshes `state` from the service.
    pub async fn read(&self, state: &Record) -> Result<Record, IpamError> {
        let id = reservation_id(state)?;
        let reservation = self.client.get_reservation(id).await?;
        bound(state, &reservation)
    }

    /// Applies the difference between `prior` and `desired`.
    ///
    /// Nothing is sent when no tracked field changed; `prior` is returned as
    /// it is.
    pub async fn update(&self, prior: &Record, desired: &Record) -> Result<Record, IpamError> {
        let changed = changed_fields(prior, desired);
        if changed.is_empty() {
            info!("No tracked fields changed; skipping update");
            return Ok(prior.clone());
        }

        let id = reservation_id(prior)?;
        info!(reservation_id = %id, changed = ?changed, "Updating IPAM reservation");
        let reservation = reservation_from_record(desired)?;
        let updated = self.client.update_reservation(id, &reservation).await?;
        bound(desired, &updated.object)
    }

    /// Deletes the reservation recorded in `state`.
    pub async fn delete(&self, state: &Record) -> Result<(), IpamError> {
        let id = reservation_id(state)?;
        self.client.delete_reservation(id).await?;
        Ok(())
    }
}

fn bound(base: &Record, reservation: &IpamReservation) -> Result<Record, IpamError> {
    let mut record = base.clone();
    bind_reservation(&mut record, reservation)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use ipam::binding::{
        FIELD_COMPUTED_HOSTNAME, FIELD_DNS_SEARCH_SUFFIX, FIELD_HOSTNAME, FIELD_ID,
        FIELD_IP_ADDRESS, FIELD_POLICY_ID, FIELD_WORKSPACE_URL,
    };
    use ipam::HttpMethod;
    use serde_json::json;

    use super::*;
    use crate::testing::{config, ScriptedTransport};

    const BASE: &str = "https://athena.test:443/api/v3/onefuse";

    fn url(path: &str) -> String {
        format!("{BASE}/{path}")
    }

    fn reservation_55() -> serde_json::Value {
        json!({
            "id": 55,
            "hostname": "web-01.corp.local",
            "ipAddress": "10.1.1.5",
            "netmask": "255.255.255.0",
            "_links": {
                "workspace": { "href": "/api/v3/onefuse/workspaces/1/" },
                "policy": { "href": "/api/v3/onefuse/ipamPolicies/42/" }
            }
        })
    }

    fn state() -> Record {
        Record::new()
            .with(FIELD_ID, 55_i64)
            .with(FIELD_HOSTNAME, "web-01")
            .with(FIELD_POLICY_ID, 42_i64)
    }

    #[tokio::test(start_paused = true)]
    async fn create_fills_in_computed_fields() {
        let transport = ScriptedTransport::new();
        let job = json!({
            "id": 7,
            "jobState": "Successful",
            "_links": { "managedObject": { "href": "/api/v3/onefuse/ipamReservations/55/" } }
        });
        transport.respond(
            HttpMethod::Get,
            &url("workspaces/"),
            200,
            json!({ "_embedded": { "workspaces": [{ "id": 1, "name": "Default" }] } }),
        );
        transport.respond(HttpMethod::Post, &url("ipamReservations/"), 202, job.clone());
        transport.respond(HttpMethod::Get, &url("jobStatus/7/"), 200, job);
        transport.respond(HttpMethod::Get, &url("ipamReservations/55/"), 200, reservation_55());
        let client = IpamClient::new(&transport, config());
        let desired = Record::new()
            .with(FIELD_HOSTNAME, "web-01")
            .with(FIELD_POLICY_ID, 42_i64)
            .with(FIELD_DNS_SEARCH_SUFFIX, vec!["corp.local".to_string()]);

        let record = ReservationResource::new(&client).create(&desired).await.unwrap();

        assert_eq!(record.get_int(FIELD_ID).unwrap(), Some(55));
        assert_eq!(record.get_str(FIELD_HOSTNAME).unwrap(), Some("web-01"));
        assert_eq!(
            record.get_str(FIELD_COMPUTED_HOSTNAME).unwrap(),
            Some("web-01.corp.local")
        );
        assert_eq!(record.get_str(FIELD_IP_ADDRESS).unwrap(), Some("10.1.1.5"));
        assert_eq!(
            record.get_str(FIELD_WORKSPACE_URL).unwrap(),
            Some("/api/v3/onefuse/workspaces/1/")
        );
        assert_eq!(record.get_int(FIELD_POLICY_ID).unwrap(), Some(42));

        let post = &transport.calls_to(HttpMethod::Post, &url("ipamReservations/"))[0];
        assert!(post.body.as_ref().unwrap().get("dnsSearchSuffixes").is_none());
    }

    #[tokio::test]
    async fn read_refreshes_state() {
        let transport = ScriptedTransport::new();
        transport.respond(HttpMethod::Get, &url("ipamReservations/55/"), 200, reservation_55());
        let client = IpamClient::new(&transport, config());

        let record = ReservationResource::new(&client).read(&state()).await.unwrap();

        assert_eq!(record.get_str(FIELD_IP_ADDRESS).unwrap(), Some("10.1.1.5"));
        assert_eq!(record.get_str(FIELD_HOSTNAME).unwrap(), Some("web-01"));
    }

    #[tokio::test]
    async fn read_without_id_is_rejected() {
        let transport = ScriptedTransport::new();
        let client = IpamClient::new(&transport, config());
        let state = Record::new().with(FIELD_HOSTNAME, "web-01");

        let err = ReservationResource::new(&client).read(&state).await.unwrap_err();

        assert!(matches!(err, IpamError::InvalidRequest { .. }));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn unchanged_update_makes_no_call() {
        let transport = ScriptedTransport::new();
        let client = IpamClient::new(&transport, config());
        let prior = state();
        // Only the untracked search suffixes differ.
        let desired = state().with(FIELD_DNS_SEARCH_SUFFIX, vec!["corp.local".to_string()]);

        let record = ReservationResource::new(&client)
            .update(&prior, &desired)
            .await
            .unwrap();

        assert_eq!(record, prior);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn changed_update_is_not_implemented() {
        let transport = ScriptedTransport::new();
        let client = IpamClient::new(&transport, config());
        let desired = state().with(FIELD_HOSTNAME, "web-02");

        let err = ReservationResource::new(&client)
            .update(&state(), &desired)
            .await
            .unwrap_err();

        assert!(matches!(err, IpamError::NotImplemented { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_runs_delete_job() {
        let transport = ScriptedTransport::new();
        transport.respond(
            HttpMethod::Delete,
            &url("ipamReservations/55/"),
            202,
            json!({ "id": 8, "jobState": "Pending" }),
        );
        transport.respond(HttpMethod::Get, &url("jobStatus/8/"), 200, json!({ "id": 8, "jobState": "Successful" }));
        let client = IpamClient::new(&transport, config());

        ReservationResource::new(&client).delete(&state()).await.unwrap();

        assert_eq!(transport.calls().len(), 2);
    }
}
