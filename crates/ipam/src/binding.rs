//! Flat record view of a reservation.
//!
//! The host that drives this client models a reservation as a set of named
//! scalar, list, and map attributes. [`Record`] is that shape:
//! [`reservation_from_record`] reads the user-supplied attributes into a create
//! request, and [`record_from_reservation`] writes the server's view back.
//!
//! The policy id is not returned by the service as a field; it is recovered
//! from the policy hyperlink (`.../ipamPolicies/{id}/`), so a change in the
//! service's link format breaks the read-back.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::endpoints::id_from_href;
use crate::{IpamError, IpamReservation, PolicyId, ReservationId, TemplateProperties};

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

pub const FIELD_ID: &str = "id";
pub const FIELD_HOSTNAME: &str = "hostname";
pub const FIELD_COMPUTED_HOSTNAME: &str = "computed_hostname";
pub const FIELD_POLICY_ID: &str = "policy_id";
pub const FIELD_WORKSPACE_URL: &str = "workspace_url";
pub const FIELD_IP_ADDRESS: &str = "ip_address";
pub const FIELD_NETMASK: &str = "netmask";
pub const FIELD_GATEWAY: &str = "gateway";
pub const FIELD_NETWORK: &str = "network";
pub const FIELD_SUBNET: &str = "subnet";
pub const FIELD_PRIMARY_DNS: &str = "primary_dns";
pub const FIELD_SECONDARY_DNS: &str = "secondary_dns";
pub const FIELD_NIC_LABEL: &str = "nic_label";
pub const FIELD_DNS_SUFFIX: &str = "dns_suffix";
pub const FIELD_DNS_SEARCH_SUFFIX: &str = "dns_search_suffix";
pub const FIELD_TEMPLATE_PROPERTIES: &str = "template_properties";

/// Fields whose change makes an update necessary.
pub const TRACKED_FIELDS: [&str; 14] = [
    FIELD_HOSTNAME,
    FIELD_COMPUTED_HOSTNAME,
    FIELD_POLICY_ID,
    FIELD_WORKSPACE_URL,
    FIELD_IP_ADDRESS,
    FIELD_NETMASK,
    FIELD_SUBNET,
    FIELD_NETWORK,
    FIELD_GATEWAY,
    FIELD_PRIMARY_DNS,
    FIELD_SECONDARY_DNS,
    FIELD_DNS_SUFFIX,
    FIELD_NIC_LABEL,
    FIELD_TEMPLATE_PROPERTIES,
];

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A single attribute value.
///
/// Numbers are integers only; lists hold strings only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
    Map(TemplateProperties),
}

impl FieldValue {
    fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "integer",
            FieldValue::Str(_) => "string",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
        }
    }
}

impl TryFrom<Value> for FieldValue {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(FieldValue::Null),
            Value::Bool(b) => Ok(FieldValue::Bool(b)),
            Value::Number(n) => n.as_i64().map(FieldValue::Int).ok_or_else(|| {
                format!("unsupported number {n}: record attributes hold integers only")
            }),
            Value::String(s) => Ok(FieldValue::Str(s)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(format!(
                        "unsupported list element {other}: record lists hold strings only"
                    )),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List),
            Value::Object(map) => Ok(FieldValue::Map(map)),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FieldValue::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<TemplateProperties> for FieldValue {
    fn from(value: TemplateProperties) -> Self {
        FieldValue::Map(value)
    }
}

/// Named attributes of one reservation, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, FieldValue>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// String attribute; absent, null, and empty all read as `None`.
    pub fn get_str(&self, name: &str) -> Result<Option<&str>, IpamError> {
        match self.0.get(name) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Str(s)) if s.is_empty() => Ok(None),
            Some(FieldValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(type_mismatch(name, "string", other)),
        }
    }

    /// Integer attribute; absent, null, and zero all read as `None`.
    pub fn get_int(&self, name: &str) -> Result<Option<i64>, IpamError> {
        match self.0.get(name) {
            None | Some(FieldValue::Null) | Some(FieldValue::Int(0)) => Ok(None),
            Some(FieldValue::Int(i)) => Ok(Some(*i)),
            Some(FieldValue::Str(s)) => s
                .parse::<i64>()
                .map(Some)
                .map_err(|_| type_mismatch(name, "integer", &FieldValue::Str(s.clone()))),
            Some(other) => Err(type_mismatch(name, "integer", other)),
        }
    }

    /// List attribute; absent, null, and empty all read as `None`.
    pub fn get_list(&self, name: &str) -> Result<Option<&[String]>, IpamError> {
        match self.0.get(name) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::List(l)) if l.is_empty() => Ok(None),
            Some(FieldValue::List(l)) => Ok(Some(l)),
            Some(other) => Err(type_mismatch(name, "list", other)),
        }
    }

    /// Map attribute; absent, null, and empty all read as `None`.
    pub fn get_map(&self, name: &str) -> Result<Option<&TemplateProperties>, IpamError> {
        match self.0.get(name) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Map(m)) if m.is_empty() => Ok(None),
            Some(FieldValue::Map(m)) => Ok(Some(m)),
            Some(other) => Err(type_mismatch(name, "map", other)),
        }
    }
}

fn type_mismatch(name: &str, expected: &str, found: &FieldValue) -> IpamError {
    IpamError::invalid(format!(
        "'{name}' must be a {expected}, got {}",
        found.type_name()
    ))
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Builds a create request from the user-supplied attributes.
///
/// `hostname` is required and `policy_id`, when set, must be positive; a
/// missing policy is rejected later by the create operation. Server-computed
/// attributes (`id`, `computed_hostname`) are ignored.
pub fn reservation_from_record(record: &Record) -> Result<IpamReservation, IpamError> {
    let hostname = record
        .get_str(FIELD_HOSTNAME)?
        .ok_or_else(|| IpamError::invalid("'hostname' is required"))?;

    let policy_id = match record.get_int(FIELD_POLICY_ID)? {
        Some(id) if id > 0 => Some(PolicyId::new(id as u64)),
        Some(id) => {
            return Err(IpamError::invalid(format!(
                "'policy_id' must be positive, got {id}"
            )))
        }
        None => None,
    };

    let owned = |name: &str| -> Result<Option<String>, IpamError> {
        Ok(record.get_str(name)?.map(str::to_string))
    };

    Ok(IpamReservation {
        policy_id,
        workspace: owned(FIELD_WORKSPACE_URL)?,
        ip_address: owned(FIELD_IP_ADDRESS)?,
        netmask: owned(FIELD_NETMASK)?,
        subnet: owned(FIELD_SUBNET)?,
        gateway: owned(FIELD_GATEWAY)?,
        network: owned(FIELD_NETWORK)?,
        primary_dns: owned(FIELD_PRIMARY_DNS)?,
        secondary_dns: owned(FIELD_SECONDARY_DNS)?,
        dns_suffix: owned(FIELD_DNS_SUFFIX)?,
        dns_search_suffixes: record.get_list(FIELD_DNS_SEARCH_SUFFIX)?.map(<[String]>::to_vec),
        nic_label: owned(FIELD_NIC_LABEL)?,
        template_properties: record.get_map(FIELD_TEMPLATE_PROPERTIES)?.cloned(),
        ..IpamReservation::new(hostname)
    })
}

/// Writes the server's view of a reservation over `record`.
///
/// The user-supplied `hostname` and `template_properties` are left as they
/// are; the server's hostname lands in `computed_hostname`. The policy id is
/// parsed out of the policy hyperlink when one is present.
pub fn bind_reservation(record: &mut Record, reservation: &IpamReservation) -> Result<(), IpamError> {
    if let Some(id) = reservation.id {
        let id = i64::try_from(id.as_u64()).map_err(|_| {
            IpamError::invalid(format!("reservation id {id} does not fit a record integer"))
        })?;
        record.set(FIELD_ID, id);
    }
    record.set(FIELD_COMPUTED_HOSTNAME, reservation.hostname.as_str());
    if let Some(href) = reservation.workspace_href() {
        record.set(FIELD_WORKSPACE_URL, href);
    }

    let computed = [
        (FIELD_IP_ADDRESS, &reservation.ip_address),
        (FIELD_NETMASK, &reservation.netmask),
        (FIELD_PRIMARY_DNS, &reservation.primary_dns),
        (FIELD_SECONDARY_DNS, &reservation.secondary_dns),
        (FIELD_GATEWAY, &reservation.gateway),
        (FIELD_NETWORK, &reservation.network),
        (FIELD_SUBNET, &reservation.subnet),
        (FIELD_NIC_LABEL, &reservation.nic_label),
        (FIELD_DNS_SUFFIX, &reservation.dns_suffix),
    ];
    for (name, value) in computed {
        record.set(name, value.clone().unwrap_or_default());
    }

    if let Some(suffixes) = &reservation.dns_search_suffixes {
        record.set(FIELD_DNS_SEARCH_SUFFIX, suffixes.clone());
    }

    if let Some(href) = reservation.policy_href() {
        let policy_id = i64::try_from(id_from_href(href)?).map_err(|_| IpamError::MalformedLink {
            href: href.to_string(),
        })?;
        record.set(FIELD_POLICY_ID, policy_id);
    }

    Ok(())
}

/// Record view of a reservation fetched from the service.
pub fn record_from_reservation(reservation: &IpamReservation) -> Result<Record, IpamError> {
    let mut record = Record::new().with(FIELD_HOSTNAME, reservation.hostname.as_str());
    bind_reservation(&mut record, reservation)?;
    Ok(record)
}

/// The server-assigned id stored in `record`.
pub fn reservation_id(record: &Record) -> Result<ReservationId, IpamError> {
    match record.get_int(FIELD_ID)? {
        Some(id) if id > 0 => Ok(ReservationId::new(id as u64)),
        _ => Err(IpamError::invalid("record has no reservation 'id'")),
    }
}

/// Names of the tracked fields whose values differ between `prior` and `desired`.
///
/// An absent attribute and an explicit null are the same value.
pub fn changed_fields(prior: &Record, desired: &Record) -> Vec<&'static str> {
    let normalised = |record: &Record, name: &str| -> Value {
        match record.get(name) {
            None | Some(FieldValue::Null) => Value::Null,
            Some(value) => serde_json::to_value(value).unwrap_or(Value::Null),
        }
    };
    TRACKED_FIELDS
        .iter()
        .copied()
        .filter(|name| normalised(prior, name) != normalised(desired, name))
        .collect()
}
