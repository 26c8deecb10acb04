//! Command-line surface.
//!
//! Each subcommand maps onto one client operation and prints its result to
//! stdout as pretty JSON.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use client::{IpamClient, ReservationResource};
use ipam::binding::{
    record_from_reservation, FIELD_DNS_SEARCH_SUFFIX, FIELD_DNS_SUFFIX, FIELD_GATEWAY,
    FIELD_HOSTNAME, FIELD_ID, FIELD_IP_ADDRESS, FIELD_NETMASK, FIELD_NETWORK, FIELD_NIC_LABEL,
    FIELD_POLICY_ID, FIELD_PRIMARY_DNS, FIELD_SECONDARY_DNS, FIELD_SUBNET,
    FIELD_TEMPLATE_PROPERTIES, FIELD_WORKSPACE_URL,
};
use ipam::{ApiTransport, PolicyId, Record, ReservationId, TemplateProperties};
use serde_json::{json, Value};

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(name = "athena", version, about = "Manage Athena IPAM reservations", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// OTLP collector endpoint for trace export
    #[arg(long, global = true, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// IPAM reservations
    #[command(subcommand)]
    Reservation(ReservationCommand),
    /// IPAM policies
    #[command(subcommand)]
    Policy(PolicyCommand),
    /// Workspaces
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
    /// Server-side template rendering
    #[command(subcommand)]
    Template(TemplateCommand),
}

#[derive(Subcommand, Debug)]
pub enum ReservationCommand {
    /// Create a reservation and wait for it
    Create(CreateArgs),
    /// Show a reservation
    Read { id: ReservationId },
    /// Apply the difference between two record files
    Update {
        id: ReservationId,
        /// Current record (JSON)
        #[arg(long)]
        prior: PathBuf,
        /// Desired record (JSON)
        #[arg(long)]
        desired: PathBuf,
    },
    /// Delete a reservation and wait for it
    Delete { id: ReservationId },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub hostname: String,
    #[arg(long)]
    pub policy_id: PolicyId,
    /// Workspace URL; the Default workspace when omitted
    #[arg(long)]
    pub workspace_url: Option<String>,
    #[arg(long)]
    pub ip_address: Option<String>,
    #[arg(long)]
    pub netmask: Option<String>,
    #[arg(long)]
    pub gateway: Option<String>,
    #[arg(long)]
    pub network: Option<String>,
    #[arg(long)]
    pub subnet: Option<String>,
    #[arg(long)]
    pub primary_dns: Option<String>,
    #[arg(long)]
    pub secondary_dns: Option<String>,
    #[arg(long)]
    pub nic_label: Option<String>,
    #[arg(long)]
    pub dns_suffix: Option<String>,
    /// DNS search suffix (repeatable, ordered)
    #[arg(long)]
    pub dns_search_suffix: Vec<String>,
    /// Template property as key=value (repeatable)
    #[arg(long = "property", value_parser = parse_property)]
    pub properties: Vec<(String, Value)>,
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Find a policy by name
    Find { name: String },
    /// Show a policy
    Get { id: PolicyId },
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommand {
    /// Show the Default workspace
    Default,
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// Render a template with the given properties
    Render {
        #[arg(long)]
        template: String,
        /// Template property as key=value (repeatable)
        #[arg(long = "property", value_parser = parse_property)]
        properties: Vec<(String, Value)>,
    },
}

/// Parses `key=value`. The value is taken as JSON when it parses as JSON and
/// as a plain string otherwise.
fn parse_property(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty property name in '{s}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn properties(pairs: Vec<(String, Value)>) -> Option<TemplateProperties> {
    if pairs.is_empty() {
        return None;
    }
    Some(pairs.into_iter().collect())
}

impl CreateArgs {
    fn into_record(self) -> anyhow::Result<Record> {
        let mut record = Record::new()
            .with(FIELD_HOSTNAME, self.hostname)
            .with(FIELD_POLICY_ID, record_int(self.policy_id.as_u64(), "policy id")?);
        let optional = [
            (FIELD_WORKSPACE_URL, self.workspace_url),
            (FIELD_IP_ADDRESS, self.ip_address),
            (FIELD_NETMASK, self.netmask),
            (FIELD_GATEWAY, self.gateway),
            (FIELD_NETWORK, self.network),
            (FIELD_SUBNET, self.subnet),
            (FIELD_PRIMARY_DNS, self.primary_dns),
            (FIELD_SECONDARY_DNS, self.secondary_dns),
            (FIELD_NIC_LABEL, self.nic_label),
            (FIELD_DNS_SUFFIX, self.dns_suffix),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                record.set(name, value);
            }
        }
        if !self.dns_search_suffix.is_empty() {
            record.set(FIELD_DNS_SEARCH_SUFFIX, self.dns_search_suffix);
        }
        if let Some(properties) = properties(self.properties) {
            record.set(FIELD_TEMPLATE_PROPERTIES, properties);
        }
        Ok(record)
    }
}

fn record_int(value: u64, what: &str) -> anyhow::Result<i64> {
    i64::try_from(value).with_context(|| format!("{what} {value} is out of range"))
}

fn read_record(path: &Path) -> anyhow::Result<Record> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a record", path.display()))
}

/// Runs `command` and returns the JSON document to print.
pub async fn execute<T: ApiTransport>(
    client: &IpamClient<T>,
    command: Command,
) -> anyhow::Result<Value> {
    let resource = ReservationResource::new(client);
    let output = match command {
        Command::Reservation(ReservationCommand::Create(args)) => {
            serde_json::to_value(resource.create(&args.into_record()?).await?)?
        }
        Command::Reservation(ReservationCommand::Read { id }) => {
            let reservation = client.get_reservation(id).await?;
            serde_json::to_value(record_from_reservation(&reservation)?)?
        }
        Command::Reservation(ReservationCommand::Update { id, prior, desired }) => {
            let mut prior = read_record(&prior)?;
            prior.set(FIELD_ID, record_int(id.as_u64(), "reservation id")?);
            let desired = read_record(&desired)?;
            serde_json::to_value(resource.update(&prior, &desired).await?)?
        }
        Command::Reservation(ReservationCommand::Delete { id }) => {
            let outcome = client.delete_reservation(id).await?;
            json!({
                "id": id,
                "deleted": true,
                "job_id": outcome.status.id,
                "polls": outcome.polls,
            })
        }
        Command::Policy(PolicyCommand::Find { name }) => {
            serde_json::to_value(client.find_ipam_policy_by_name(&name).await?)?
        }
        Command::Policy(PolicyCommand::Get { id }) => {
            serde_json::to_value(client.get_ipam_policy(id).await?)?
        }
        Command::Workspace(WorkspaceCommand::Default) => {
            serde_json::to_value(client.find_default_workspace().await?)?
        }
        Command::Template(TemplateCommand::Render {
            template,
            properties: pairs,
        }) => {
            let value = client.render_template(&template, properties(pairs)).await?;
            json!({ "value": value })
        }
    };
    Ok(output)
}
