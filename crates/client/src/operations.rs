//! Reservation lifecycle operations.

use ipam::{
    ApiRequest, ApiTransport, IpamError, IpamPolicy, IpamPolicyCollection, IpamReservation,
    OperationId, PolicyId, RenderTemplateRequest, RenderedTemplate, ReservationId, ResourceType,
    ServiceConfig, TemplateProperties, Workspace, WorkspaceCollection, WorkspaceId,
};
use tracing::{info, instrument};

use crate::accessors::Accessor;
use crate::jobs::{JobOutcome, JobPolicy, JobRunner, Resolved};

/// Name of the workspace used when a reservation names none.
pub const DEFAULT_WORKSPACE: &str = "Default";

/// Client for the Athena IPAM endpoints.
///
/// Holds no state between calls beyond its immutable configuration; every
/// operation runs to completion, including the full job poll loop, before it
/// returns.
pub struct IpamClient<T> {
    transport: T,
    config: ServiceConfig,
    job_policy: JobPolicy,
}

impl<T: ApiTransport> IpamClient<T> {
    pub fn new(transport: T, config: ServiceConfig) -> Self {
        Self {
            transport,
            config,
            job_policy: JobPolicy::default(),
        }
    }

    /// Replaces the poll cadence and budget.
    pub fn with_job_policy(mut self, job_policy: JobPolicy) -> Self {
        self.job_policy = job_policy;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn accessor(&self) -> Accessor<'_, T> {
        Accessor::new(&self.transport, &self.config)
    }

    fn jobs(&self) -> JobRunner<'_, T> {
        JobRunner::new(&self.transport, &self.config, self.job_policy)
    }

    // -----------------------------------------------------------------------
    // Reservations
    // -----------------------------------------------------------------------

    /// Creates a reservation and returns it as the service stored it.
    ///
    /// Exactly one of `policy_id` and `policy` must be set. When `workspace`
    /// is empty the `Default` workspace is looked up and used. The policy id,
    /// if given, is sent as its `ipamPolicies/{id}/` URL.
    ///
    /// # Errors
    ///
    /// - [`IpamError::InvalidRequest`] for an ambiguous or missing policy,
    ///   before anything is sent.
    /// - [`IpamError::NotFound`] when no `Default` workspace exists; nothing
    ///   is created in that case.
    /// - Any job error from [`JobRunner::run_and_resolve`].
    #[instrument(
        skip_all,
        fields(operation_id = %OperationId::new_random(), hostname = %reservation.hostname)
    )]
    pub async fn create_reservation(
        &self,
        mut reservation: IpamReservation,
    ) -> Result<Resolved<IpamReservation>, IpamError> {
        check_policy_reference(&reservation)?;

        match reservation.workspace.as_deref() {
            Some(href) if !href.is_empty() => {
                reservation.workspace = Some(self.config.url_from_href(href));
            }
            _ => {
                let workspace = self.default_workspace().await?;
                reservation.workspace = Some(
                    self.config
                        .item_url(ResourceType::Workspaces, workspace.id),
                );
            }
        }

        // Relative references are sent as absolute URLs.
        if let Some(policy_id) = reservation.policy_id.take() {
            reservation.policy = Some(self.config.item_url(ResourceType::IpamPolicies, policy_id));
        } else if let Some(href) = reservation.policy.as_deref() {
            reservation.policy = Some(self.config.url_from_href(href));
        }

        info!(
            workspace = reservation.workspace.as_deref().unwrap_or_default(),
            policy = reservation.policy.as_deref().unwrap_or_default(),
            "Creating IPAM reservation"
        );
        let request = ApiRequest::post(
            self.config.collection_url(ResourceType::IpamReservations),
            &reservation,
        )?;
        let resolved: Resolved<IpamReservation> = self.jobs().run_and_resolve(&request).await?;
        info!(
            reservation_id = ?resolved.object.id,
            polls = resolved.outcome.polls,
            "Created IPAM reservation"
        );
        Ok(resolved)
    }

    #[instrument(skip_all, fields(operation_id = %OperationId::new_random(), reservation_id = %id))]
    pub async fn get_reservation(&self, id: ReservationId) -> Result<IpamReservation, IpamError> {
        self.accessor()
            .get_by_id(ResourceType::IpamReservations, id)
            .await
    }

    /// Always fails with [`IpamError::NotImplemented`]; the service-side
    /// update flow is not supported.
    #[instrument(skip_all, fields(operation_id = %OperationId::new_random(), reservation_id = %id))]
    pub async fn update_reservation(
        &self,
        id: ReservationId,
        _reservation: &IpamReservation,
    ) -> Result<Resolved<IpamReservation>, IpamError> {
        Err(IpamError::NotImplemented {
            operation: "update_reservation",
        })
    }

    /// Deletes a reservation and waits for the delete job to finish.
    #[instrument(skip_all, fields(operation_id = %OperationId::new_random(), reservation_id = %id))]
    pub async fn delete_reservation(&self, id: ReservationId) -> Result<JobOutcome, IpamError> {
        let request = ApiRequest::delete(self.config.item_url(ResourceType::IpamReservations, id));
        let outcome = self.jobs().run(&request).await?;
        info!(polls = outcome.polls, "Deleted IPAM reservation");
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Workspaces and policies
    // -----------------------------------------------------------------------

    /// The workspace named exactly `Default`.
    #[instrument(skip_all, fields(operation_id = %OperationId::new_random()))]
    pub async fn find_default_workspace(&self) -> Result<Workspace, IpamError> {
        self.default_workspace().await
    }

    async fn default_workspace(&self) -> Result<Workspace, IpamError> {
        self.accessor()
            .find_by_filter::<WorkspaceCollection>(
                format!("name.exact:{DEFAULT_WORKSPACE}"),
                DEFAULT_WORKSPACE,
            )
            .await
    }

    #[instrument(skip_all, fields(operation_id = %OperationId::new_random(), workspace_id = %id))]
    pub async fn get_workspace(&self, id: WorkspaceId) -> Result<Workspace, IpamError> {
        self.accessor().get_by_id(ResourceType::Workspaces, id).await
    }

    #[instrument(skip_all, fields(operation_id = %OperationId::new_random(), policy_id = %id))]
    pub async fn get_ipam_policy(&self, id: PolicyId) -> Result<IpamPolicy, IpamError> {
        self.accessor().get_by_id(ResourceType::IpamPolicies, id).await
    }

    /// First IPAM policy whose name matches `name`.
    #[instrument(skip_all, fields(operation_id = %OperationId::new_random(), name = %name))]
    pub async fn find_ipam_policy_by_name(&self, name: &str) -> Result<IpamPolicy, IpamError> {
        self.accessor()
            .find_by_name::<IpamPolicyCollection>(name, "")
            .await
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    /// Renders `template` with `properties` on the service.
    ///
    /// Synchronous: the response carries the rendered value directly.
    #[instrument(skip_all, fields(operation_id = %OperationId::new_random()))]
    pub async fn render_template(
        &self,
        template: &str,
        properties: Option<TemplateProperties>,
    ) -> Result<String, IpamError> {
        let body = RenderTemplateRequest {
            template: template.to_string(),
            template_properties: properties,
        };
        let request =
            ApiRequest::post(self.config.collection_url(ResourceType::TemplateTester), &body)?;
        let rendered: RenderedTemplate = self.accessor().send_json(&request).await?;
        Ok(rendered.value)
    }
}

fn check_policy_reference(reservation: &IpamReservation) -> Result<(), IpamError> {
    let has_url = !reservation.policy.as_deref().unwrap_or_default().is_empty();
    match (reservation.policy_id.is_some(), has_url) {
        (true, true) => Err(IpamError::invalid(
            "both a policy id and a policy URL were given; specify exactly one",
        )),
        (false, false) => Err(IpamError::invalid(
            "a policy id or a policy URL is required",
        )),
        _ => Ok(()),
    }
}
