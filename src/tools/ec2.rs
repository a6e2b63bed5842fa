//! EC2 status tools backed by the AWS CLI.
//!
//! The [`Ec2Api`] trait is the seam between the tools and AWS. The production
//! implementation, [`AwsCliEc2`], shells out to `aws ec2 ...` with JSON output,
//! which keeps credential resolution (profiles, SSO, instance roles) identical
//! to what the operator already uses on the command line.

use crate::tools::registry::{Tool, parse_args};
use crate::types::{AppError, Result};
use crate::utils::toml_config::AwsConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Summary of one EC2 instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ec2Instance {
    pub instance_id: String,
    /// Value of the `Name` tag, if any
    pub name: Option<String>,
    pub state: String,
    pub instance_type: String,
    pub availability_zone: Option<String>,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub launch_time: Option<String>,
}

/// Health checks of one EC2 instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ec2InstanceStatus {
    pub instance_id: String,
    pub state: String,
    pub availability_zone: Option<String>,
    pub system_status: String,
    pub instance_status: String,
}

/// Read-only EC2 operations used by the EC2 agent
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// List instances, optionally filtered by state (`running`, `stopped`, ...)
    async fn describe_instances(&self, state: Option<String>) -> Result<Vec<Ec2Instance>>;

    /// Status checks for a single instance
    async fn describe_instance_status(&self, instance_id: String) -> Result<Ec2InstanceStatus>;
}

// ============= AWS CLI implementation =============

pub struct AwsCliEc2 {
    cli_path: String,
    profile: Option<String>,
    region: String,
    timeout: Duration,
}

impl AwsCliEc2 {
    pub fn new(config: &AwsConfig) -> Self {
        Self {
            cli_path: config.cli_path.clone(),
            profile: config.profile.clone(),
            region: config.region.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn base_args(&self, operation: &str) -> Vec<String> {
        let mut args = vec![
            "ec2".to_string(),
            operation.to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--region".to_string(),
            self.region.clone(),
        ];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }

    fn describe_instances_args(&self, state: Option<&str>) -> Vec<String> {
        let mut args = self.base_args("describe-instances");
        if let Some(state) = state {
            args.push("--filters".to_string());
            args.push(format!("Name=instance-state-name,Values={}", state));
        }
        args
    }

    fn describe_instance_status_args(&self, instance_id: &str) -> Vec<String> {
        let mut args = self.base_args("describe-instance-status");
        args.push("--instance-ids".to_string());
        args.push(instance_id.to_string());
        args.push("--include-all-instances".to_string());
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<String> {
        tracing::debug!(cli = %self.cli_path, ?args, "Running AWS CLI");

        let mut command = Command::new(&self.cli_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                AppError::Tool(format!(
                    "AWS CLI timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::Tool(format!("Failed to run {}: {}", self.cli_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Tool(format!(
                "AWS CLI exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| AppError::Tool(format!("AWS CLI returned invalid UTF-8: {}", e)))
    }
}

#[async_trait]
impl Ec2Api for AwsCliEc2 {
    async fn describe_instances(&self, state: Option<String>) -> Result<Vec<Ec2Instance>> {
        let raw = self
            .run(self.describe_instances_args(state.as_deref()))
            .await?;
        parse_describe_instances(&raw)
    }

    async fn describe_instance_status(&self, instance_id: String) -> Result<Ec2InstanceStatus> {
        let raw = self
            .run(self.describe_instance_status_args(&instance_id))
            .await?;
        parse_describe_instance_status(&raw, &instance_id)
    }
}

// ============= CLI output parsing =============

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesOutput {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<RawInstance>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawInstance {
    instance_id: String,
    #[serde(default)]
    instance_type: String,
    state: RawState,
    #[serde(default)]
    placement: Option<RawPlacement>,
    #[serde(default)]
    private_ip_address: Option<String>,
    #[serde(default)]
    public_ip_address: Option<String>,
    #[serde(default)]
    launch_time: Option<String>,
    #[serde(default)]
    tags: Vec<RawTag>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawState {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPlacement {
    availability_zone: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTag {
    key: String,
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstanceStatusOutput {
    #[serde(default)]
    instance_statuses: Vec<RawInstanceStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawInstanceStatus {
    instance_id: String,
    #[serde(default)]
    availability_zone: Option<String>,
    instance_state: RawState,
    #[serde(default)]
    system_status: Option<RawCheck>,
    #[serde(default)]
    instance_status: Option<RawCheck>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCheck {
    status: String,
}

fn parse_describe_instances(raw: &str) -> Result<Vec<Ec2Instance>> {
    let output: DescribeInstancesOutput = serde_json::from_str(raw)
        .map_err(|e| AppError::Tool(format!("Unexpected describe-instances output: {}", e)))?;

    Ok(output
        .reservations
        .into_iter()
        .flat_map(|r| r.instances)
        .map(|i| Ec2Instance {
            name: i
                .tags
                .iter()
                .find(|t| t.key == "Name")
                .map(|t| t.value.clone()),
            instance_id: i.instance_id,
            state: i.state.name,
            instance_type: i.instance_type,
            availability_zone: i.placement.and_then(|p| p.availability_zone),
            private_ip: i.private_ip_address,
            public_ip: i.public_ip_address,
            launch_time: i.launch_time,
        })
        .collect())
}

fn parse_describe_instance_status(raw: &str, instance_id: &str) -> Result<Ec2InstanceStatus> {
    let output: DescribeInstanceStatusOutput = serde_json::from_str(raw).map_err(|e| {
        AppError::Tool(format!("Unexpected describe-instance-status output: {}", e))
    })?;

    let status = output
        .instance_statuses
        .into_iter()
        .find(|s| s.instance_id == instance_id)
        .ok_or_else(|| AppError::NotFound(format!("Instance {} not found", instance_id)))?;

    // Checks are absent for stopped instances
    let check = |c: Option<RawCheck>| {
        c.map(|c| c.status)
            .unwrap_or_else(|| "not-applicable".to_string())
    };

    Ok(Ec2InstanceStatus {
        instance_id: status.instance_id,
        state: status.instance_state.name,
        availability_zone: status.availability_zone,
        system_status: check(status.system_status),
        instance_status: check(status.instance_status),
    })
}

// ============= Tools =============

const INSTANCE_STATES: [&str; 6] = [
    "pending",
    "running",
    "shutting-down",
    "terminated",
    "stopping",
    "stopped",
];

/// Lists EC2 instances in the configured region
pub struct ListInstancesTool {
    api: Arc<dyn Ec2Api>,
}

impl ListInstancesTool {
    pub fn new(api: Arc<dyn Ec2Api>) -> Self {
        Self { api }
    }
}

#[derive(Deserialize)]
struct ListInstancesArgs {
    #[serde(default)]
    state: Option<String>,
}

#[async_trait]
impl Tool for ListInstancesTool {
    fn name(&self) -> &str {
        "list_ec2_instances"
    }

    fn description(&self) -> &str {
        "List EC2 instances in the configured AWS region with their name, state, type, \
         availability zone and IP addresses. Optionally filter by instance state."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "state": {
                    "type": "string",
                    "enum": INSTANCE_STATES,
                    "description": "Only return instances in this state"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: ListInstancesArgs = parse_args(self.name(), args)?;

        if let Some(state) = &args.state
            && !INSTANCE_STATES.contains(&state.as_str())
        {
            return Err(AppError::InvalidInput(format!(
                "Unknown instance state '{}'",
                state
            )));
        }

        let instances = self.api.describe_instances(args.state).await?;

        Ok(json!({
            "count": instances.len(),
            "instances": instances,
        }))
    }
}

/// Reports state and status checks of one EC2 instance
pub struct InstanceStatusTool {
    api: Arc<dyn Ec2Api>,
}

impl InstanceStatusTool {
    pub fn new(api: Arc<dyn Ec2Api>) -> Self {
        Self { api }
    }
}

#[derive(Deserialize)]
struct InstanceStatusArgs {
    instance_id: String,
}

#[async_trait]
impl Tool for InstanceStatusTool {
    fn name(&self) -> &str {
        "get_ec2_instance_status"
    }

    fn description(&self) -> &str {
        "Get the state and the system/instance status checks of a single EC2 instance"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "instance_id": {
                    "type": "string",
                    "description": "Instance ID, e.g. i-0abc123def4567890"
                }
            },
            "required": ["instance_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let args: InstanceStatusArgs = parse_args(self.name(), args)?;
        let instance_id = args.instance_id.trim();

        if !instance_id.starts_with("i-") {
            return Err(AppError::InvalidInput(format!(
                "'{}' is not an EC2 instance ID",
                instance_id
            )));
        }

        let status = self
            .api
            .describe_instance_status(instance_id.to_string())
            .await?;

        serde_json::to_value(status).map_err(|e| AppError::Internal(e.to_string()))
    }
}

/// Both EC2 tools over one API handle
pub fn ec2_tools(api: Arc<dyn Ec2Api>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListInstancesTool::new(Arc::clone(&api))),
        Arc::new(InstanceStatusTool::new(api)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    const DESCRIBE_INSTANCES: &str = r#"{
        "Reservations": [{
            "Instances": [{
                "InstanceId": "i-0123456789abcdef0",
                "InstanceType": "t3.micro",
                "State": {"Code": 16, "Name": "running"},
                "Placement": {"AvailabilityZone": "us-east-1a"},
                "PrivateIpAddress": "10.0.1.12",
                "PublicIpAddress": "54.1.2.3",
                "LaunchTime": "2025-03-01T10:00:00+00:00",
                "Tags": [{"Key": "env", "Value": "prod"}, {"Key": "Name", "Value": "web-1"}]
            }]
        }, {
            "Instances": [{
                "InstanceId": "i-0fedcba9876543210",
                "InstanceType": "m5.large",
                "State": {"Code": 80, "Name": "stopped"}
            }]
        }]
    }"#;

    fn instance(id: &str, state: &str) -> Ec2Instance {
        Ec2Instance {
            instance_id: id.to_string(),
            name: None,
            state: state.to_string(),
            instance_type: "t3.micro".to_string(),
            availability_zone: None,
            private_ip: None,
            public_ip: None,
            launch_time: None,
        }
    }

    #[test]
    fn test_parse_describe_instances() {
        let instances = parse_describe_instances(DESCRIBE_INSTANCES).unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].name.as_deref(), Some("web-1"));
        assert_eq!(instances[0].state, "running");
        assert_eq!(instances[0].availability_zone.as_deref(), Some("us-east-1a"));
        assert_eq!(instances[0].public_ip.as_deref(), Some("54.1.2.3"));
        assert_eq!(instances[1].name, None);
        assert_eq!(instances[1].state, "stopped");
    }

    #[test]
    fn test_parse_empty_reservations() {
        assert!(parse_describe_instances("{}").unwrap().is_empty());
        assert!(parse_describe_instances("not json").is_err());
    }

    #[test]
    fn test_parse_instance_status() {
        let raw = r#"{
            "InstanceStatuses": [{
                "InstanceId": "i-0123456789abcdef0",
                "AvailabilityZone": "us-east-1a",
                "InstanceState": {"Code": 16, "Name": "running"},
                "SystemStatus": {"Status": "ok"},
                "InstanceStatus": {"Status": "impaired"}
            }]
        }"#;

        let status = parse_describe_instance_status(raw, "i-0123456789abcdef0").unwrap();
        assert_eq!(status.state, "running");
        assert_eq!(status.system_status, "ok");
        assert_eq!(status.instance_status, "impaired");
    }

    #[test]
    fn test_parse_instance_status_stopped_and_missing() {
        let raw = r#"{"InstanceStatuses": [{
            "InstanceId": "i-0fedcba9876543210",
            "InstanceState": {"Code": 80, "Name": "stopped"}
        }]}"#;

        let status = parse_describe_instance_status(raw, "i-0fedcba9876543210").unwrap();
        assert_eq!(status.system_status, "not-applicable");

        let missing = parse_describe_instance_status(raw, "i-0000000000000000a");
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_cli_args() {
        let api = AwsCliEc2::new(&AwsConfig {
            profile: Some("ops".to_string()),
            region: "eu-west-1".to_string(),
            cli_path: "aws".to_string(),
            timeout_secs: 5,
        });

        let args = api.describe_instances_args(Some("running"));
        assert_eq!(&args[..2], &["ec2", "describe-instances"]);
        assert!(args.windows(2).any(|w| w == ["--region", "eu-west-1"]));
        assert!(args.windows(2).any(|w| w == ["--profile", "ops"]));
        assert!(args.contains(&"Name=instance-state-name,Values=running".to_string()));

        let args = api.describe_instance_status_args("i-1");
        assert!(args.windows(2).any(|w| w == ["--instance-ids", "i-1"]));
        assert!(args.contains(&"--include-all-instances".to_string()));
    }

    #[tokio::test]
    async fn test_cli_missing_binary() {
        let api = AwsCliEc2::new(&AwsConfig {
            cli_path: "/nonexistent/aws-cli-binary".to_string(),
            ..Default::default()
        });

        let err = api.describe_instances(None).await.unwrap_err();
        assert!(matches!(err, AppError::Tool(_)));
    }

    #[tokio::test]
    async fn test_list_tool_passes_state_filter() {
        let mut api = MockEc2Api::new();
        api.expect_describe_instances()
            .with(eq(Some("stopped".to_string())))
            .times(1)
            .returning(|_| Ok(vec![instance("i-1", "stopped")]));

        let tool = ListInstancesTool::new(Arc::new(api));
        let result = tool.execute(json!({"state": "stopped"})).await.unwrap();

        assert_eq!(result["count"], 1);
        assert_eq!(result["instances"][0]["instance_id"], "i-1");
    }

    #[tokio::test]
    async fn test_list_tool_rejects_unknown_state() {
        let mut api = MockEc2Api::new();
        api.expect_describe_instances().never();

        let tool = ListInstancesTool::new(Arc::new(api));
        let result = tool.execute(json!({"state": "hibernating"})).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_status_tool() {
        let mut api = MockEc2Api::new();
        api.expect_describe_instance_status()
            .with(eq("i-0123456789abcdef0".to_string()))
            .returning(|id| {
                Ok(Ec2InstanceStatus {
                    instance_id: id,
                    state: "running".to_string(),
                    availability_zone: Some("us-east-1b".to_string()),
                    system_status: "ok".to_string(),
                    instance_status: "ok".to_string(),
                })
            });

        let tool = InstanceStatusTool::new(Arc::new(api));
        let result = tool
            .execute(json!({"instance_id": " i-0123456789abcdef0 "}))
            .await
            .unwrap();

        assert_eq!(result["state"], "running");
        assert_eq!(result["system_status"], "ok");
    }

    #[tokio::test]
    async fn test_status_tool_validates_id() {
        let api = MockEc2Api::new();
        let tool = InstanceStatusTool::new(Arc::new(api));

        assert!(tool.execute(json!({"instance_id": "web-1"})).await.is_err());
        assert!(tool.execute(json!({})).await.is_err());
    }

    #[test]
    fn test_ec2_tools_names() {
        let tools = ec2_tools(Arc::new(MockEc2Api::new()));
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["list_ec2_instances", "get_ec2_instance_status"]);
    }
}
