//! BMC user provisioning through IPMI user management commands.

use std::thread;
use std::time::Duration;

use crate::commands::{
    MAX_USER_ID, PasswordCheck, PasswordWidth, SetUserAccess, SetUserEnabled, SetUserName,
    SetUserPassword, SetUserPayloadAccess, TestUserPassword,
};
use crate::error::{Error, Result};
use crate::ipmi::Ipmi;
use crate::password::PasswordConstraints;
use crate::secret::SecretString;
use crate::types::PrivilegeLevel;

/// Account to provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BmcUser {
    /// User id slot, `1..=0x3F`.
    pub id: u8,
    /// Login name; encoded in 16 bytes.
    pub name: String,
    /// Channel the access rights apply to.
    pub channel: u8,
}

/// Bounded retry for steps BMCs are known to reject transiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first; zero behaves as one.
    pub attempts: u32,
    /// Sleep between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(1),
        }
    }
}

/// Creates users and manages their passwords.
#[derive(Debug, Clone)]
pub struct Provisioner {
    ipmi: Ipmi,
    retry: RetryPolicy,
}

impl Provisioner {
    /// Provision through `ipmi` with the default retry policy.
    pub fn new(ipmi: Ipmi) -> Self {
        Self {
            ipmi,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create or overwrite `user` and return the password that was set.
    ///
    /// The name is written once; a failure there aborts. Password, enable, channel
    /// access and SOL payload access are each retried. Without an explicit password
    /// one is generated per attempt from `constraints`.
    pub fn create_user(
        &self,
        user: &BmcUser,
        privilege: PrivilegeLevel,
        password: Option<SecretString>,
        constraints: PasswordConstraints,
    ) -> Result<SecretString> {
        check_user_id(user.id)?;
        if password.is_none() {
            constraints.validate()?;
        }
        tracing::info!(user_id = user.id, channel = user.channel, "provisioning bmc user");

        self.ipmi
            .execute(SetUserName {
                user_id: user.id,
                name: user.name.clone(),
            })
            .map_err(|err| Error::Provisioning {
                step: "set user name",
                attempts: 1,
                source: Box::new(err),
            })?;

        let password = self.set_password(user.id, password.as_ref(), constraints)?;

        self.retry("enable user", || {
            self.ipmi.execute(SetUserEnabled {
                user_id: user.id,
                enabled: true,
            })
        })?;

        self.retry("set channel access", || {
            self.ipmi
                .execute(SetUserAccess::new(user.channel, user.id, privilege))
        })?;

        self.retry("enable sol payload", || {
            self.ipmi.execute(SetUserPayloadAccess {
                channel: user.channel,
                user_id: user.id,
                enable: true,
                sol: true,
            })
        })?;

        Ok(password)
    }

    /// Set a new password for `user_id`, generating one when `password` is `None`.
    pub fn change_password(
        &self,
        user_id: u8,
        password: Option<SecretString>,
        constraints: PasswordConstraints,
    ) -> Result<SecretString> {
        check_user_id(user_id)?;
        if password.is_none() {
            constraints.validate()?;
        }
        self.set_password(user_id, password.as_ref(), constraints)
    }

    /// Ask the BMC whether `candidate` is the stored password of `user_id`.
    pub fn check_password(
        &self,
        user_id: u8,
        candidate: &SecretString,
        width: PasswordWidth,
    ) -> Result<PasswordCheck> {
        check_user_id(user_id)?;
        self.ipmi.execute(TestUserPassword {
            user_id,
            password: candidate.clone(),
            width,
        })
    }

    fn set_password(
        &self,
        user_id: u8,
        password: Option<&SecretString>,
        constraints: PasswordConstraints,
    ) -> Result<SecretString> {
        self.retry("set password", || {
            let password = match password {
                Some(password) => password.clone(),
                None => constraints.generate()?,
            };
            self.ipmi.execute(SetUserPassword {
                user_id,
                password: password.clone(),
            })?;
            Ok(password)
        })
    }

    fn retry<T>(&self, step: &'static str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts => {
                    tracing::warn!(step, attempt, error = %err, "provisioning step failed, retrying");
                    thread::sleep(self.retry.delay);
                    attempt += 1;
                }
                Err(err) => {
                    return Err(Error::Provisioning {
                        step,
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
            }
        }
    }
}

fn check_user_id(user_id: u8) -> Result<()> {
    if user_id == 0 || user_id > MAX_USER_ID {
        return Err(Error::InvalidArgument("user id must be between 1 and 63"));
    }
    Ok(())
}
