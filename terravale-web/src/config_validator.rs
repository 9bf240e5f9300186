//! Startup validation for the web server configuration
//!
//! Goes beyond [`TerravaleConfig::validate`]: checks that only matter once the
//! server faces browsers (cross-site cookies, signing secrets, store URLs).

use crate::{WebError, WebResult};
use serde::{Deserialize, Serialize};
use std::{net::IpAddr, path::Path};
use terravale_core::TerravaleConfig;
use tracing::{error, info, warn};

/// Signing secrets shorter than this are flagged
pub const MIN_SECRET_LEN: usize = 32;

/// Configuration validation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub recommendations: Vec<String>,
}

/// Configuration validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub severity: ErrorSeverity,
}

/// Configuration validation warning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub recommendation: String,
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete server configuration
    pub fn validate_config(config: &TerravaleConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();

        Self::validate_network_config(config, &mut errors, &mut warnings);
        Self::validate_cors_config(config, &mut errors, &mut warnings);
        Self::validate_session_config(config, &mut errors, &mut warnings);
        Self::validate_database_config(config, &mut errors, &mut warnings);

        if config.server.dev_mode {
            warnings.push(ValidationWarning {
                field: "server.dev_mode".to_string(),
                message: "Development mode is enabled".to_string(),
                recommendation: "Disable development mode for production deployment".to_string(),
            });
        }

        if config.server.host == "0.0.0.0" {
            recommendations
                .push("Terminate TLS in front of the server; session cookies are Secure-only".to_string());
        }
        if config.database.url.is_none() {
            recommendations.push("Set DATABASE_URL so accounts survive a restart".to_string());
        }

        let is_valid = errors
            .iter()
            .all(|e| !matches!(e.severity, ErrorSeverity::Critical));

        ValidationResult {
            is_valid,
            errors,
            warnings,
            recommendations,
        }
    }

    fn validate_network_config(
        config: &TerravaleConfig,
        errors: &mut Vec<ValidationError>,
        warnings: &mut Vec<ValidationWarning>,
    ) {
        let server = &config.server;

        if server.host.is_empty() {
            errors.push(ValidationError {
                field: "server.host".to_string(),
                message: "Host cannot be empty".to_string(),
                severity: ErrorSeverity::Critical,
            });
        } else if server.host.parse::<IpAddr>().is_err() && server.host != "localhost" {
            errors.push(ValidationError {
                field: "server.host".to_string(),
                message: format!("Invalid host format: {}", server.host),
                severity: ErrorSeverity::High,
            });
        }

        if server.port == 0 {
            errors.push(ValidationError {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
                severity: ErrorSeverity::Critical,
            });
        } else if server.port < 1024 && !server.dev_mode {
            warnings.push(ValidationWarning {
                field: "server.port".to_string(),
                message: format!("Using privileged port {} in production", server.port),
                recommendation: "Consider using a port >= 1024".to_string(),
            });
        }
    }

    /// The session cookie is sent cross-site, so every allowed origin must be explicit
    fn validate_cors_config(
        config: &TerravaleConfig,
        errors: &mut Vec<ValidationError>,
        warnings: &mut Vec<ValidationWarning>,
    ) {
        let origins = &config.server.allowed_origins;

        if origins.is_empty() {
            warnings.push(ValidationWarning {
                field: "server.allowed_origins".to_string(),
                message: "No frontend origins are allowed".to_string(),
                recommendation: "List the portal origins in TERRAVALE_ALLOWED_ORIGINS".to_string(),
            });
        }

        for origin in origins {
            if origin == "*" {
                errors.push(ValidationError {
                    field: "server.allowed_origins".to_string(),
                    message: "Wildcard origin cannot be combined with credentialed requests"
                        .to_string(),
                    severity: ErrorSeverity::Critical,
                });
            } else if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                errors.push(ValidationError {
                    field: "server.allowed_origins".to_string(),
                    message: format!("Origin must include a scheme: {}", origin),
                    severity: ErrorSeverity::High,
                });
            } else if origin.starts_with("http://") && !config.server.dev_mode {
                warnings.push(ValidationWarning {
                    field: "server.allowed_origins".to_string(),
                    message: format!("Plain HTTP origin in production: {}", origin),
                    recommendation: "Serve the portals over HTTPS".to_string(),
                });
            }
        }
    }

    fn validate_session_config(
        config: &TerravaleConfig,
        errors: &mut Vec<ValidationError>,
        warnings: &mut Vec<ValidationWarning>,
    ) {
        match config.session.jwt_secret.as_deref() {
            None => warnings.push(ValidationWarning {
                field: "session.jwt_secret".to_string(),
                message: "No signing secret configured; sessions end on restart".to_string(),
                recommendation: "Set JWT_SECRET".to_string(),
            }),
            Some("") => errors.push(ValidationError {
                field: "session.jwt_secret".to_string(),
                message: "Signing secret cannot be empty".to_string(),
                severity: ErrorSeverity::Critical,
            }),
            Some(secret) if secret.len() < MIN_SECRET_LEN => warnings.push(ValidationWarning {
                field: "session.jwt_secret".to_string(),
                message: format!("Signing secret is shorter than {} bytes", MIN_SECRET_LEN),
                recommendation: "Use a long random value for JWT_SECRET".to_string(),
            }),
            Some(_) => {}
        }

        if config.session.issuer.trim().is_empty() {
            errors.push(ValidationError {
                field: "session.issuer".to_string(),
                message: "Token issuer cannot be empty".to_string(),
                severity: ErrorSeverity::High,
            });
        }
    }

    fn validate_database_config(
        config: &TerravaleConfig,
        errors: &mut Vec<ValidationError>,
        warnings: &mut Vec<ValidationWarning>,
    ) {
        let Some(database_url) = &config.database.url else {
            if !config.server.dev_mode {
                warnings.push(ValidationWarning {
                    field: "database.url".to_string(),
                    message: "No credential store configured for production".to_string(),
                    recommendation: "Accounts are kept in memory only".to_string(),
                });
            }
            return;
        };

        if database_url.is_empty() {
            errors.push(ValidationError {
                field: "database.url".to_string(),
                message: "Database URL cannot be empty if provided".to_string(),
                severity: ErrorSeverity::Critical,
            });
            return;
        }

        let Some(path) = database_url.strip_prefix("sqlite:") else {
            errors.push(ValidationError {
                field: "database.url".to_string(),
                message: format!("Unsupported database URL: {}", database_url),
                severity: ErrorSeverity::Critical,
            });
            return;
        };

        let path = path.trim_start_matches("//");
        if path.contains(":memory:") {
            if !config.server.dev_mode {
                warnings.push(ValidationWarning {
                    field: "database.url".to_string(),
                    message: "Using in-memory database in production".to_string(),
                    recommendation: "Use a persistent database file".to_string(),
                });
            }
            return;
        }

        let file = path.split('?').next().unwrap_or(path);
        if let Some(parent) = Path::new(file).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                errors.push(ValidationError {
                    field: "database.url".to_string(),
                    message: format!("Database directory does not exist: {}", parent.display()),
                    severity: ErrorSeverity::High,
                });
            }
        }
    }

    /// Log validation results
    pub fn log_validation_results(result: &ValidationResult) {
        if result.is_valid {
            info!("Configuration validation passed");
        } else {
            warn!("Configuration validation failed");
        }

        for e in &result.errors {
            error!("{} ({:?}): {}", e.field, e.severity, e.message);
        }

        for w in &result.warnings {
            warn!("{}: {} ({})", w.field, w.message, w.recommendation);
        }

        for recommendation in &result.recommendations {
            info!("Recommendation: {}", recommendation);
        }
    }
}

/// Validate configuration, failing on any critical error
pub fn validate_config(config: &TerravaleConfig) -> WebResult<ValidationResult> {
    let result = ConfigValidator::validate_config(config);
    ConfigValidator::log_validation_results(&result);

    if !result.is_valid {
        return Err(WebError::Config(
            "Configuration validation failed".to_string(),
        ));
    }

    Ok(result)
}
