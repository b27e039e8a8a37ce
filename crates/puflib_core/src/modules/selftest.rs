//! Two-step self-test module.
//!
//! Exercises the resumable provisioning path without hardware: the first
//! invocation creates the temp store at step 1, the second advances it, the
//! third writes the final marker.

use crate::module::{ModuleInfo, ProvisionContext, ProvisionOutcome, PufModule};
use crate::nv_store::StorageKind;
use crate::provision::{
    format_step, ProvisionError, SessionStart, StepSession, PROVISIONED_MARKER,
};
use crate::status::StatusLevel;

const QUERY_CAPACITY: usize = 500;

pub const SELFTEST_INFO: ModuleInfo = ModuleInfo::new(
    "puflibtest",
    "PUFlib maintainers",
    "puflib test module",
);

/// Hardware-free module driving a step counter through its temp store.
#[derive(Debug, Clone)]
pub struct SelfTestModule {
    info: ModuleInfo,
}

impl SelfTestModule {
    pub fn new() -> Self {
        Self::with_info(SELFTEST_INFO)
    }

    /// Same behaviour under another identity.
    pub fn with_info(info: ModuleInfo) -> Self {
        Self { info }
    }

    fn start(&self, ctx: &ProvisionContext) -> ProvisionOutcome {
        let bus = ctx.bus();
        bus.report(
            &self.info,
            StatusLevel::Info,
            "provisioning will continue after the next invocation",
        );

        let mut answer = String::new();
        match bus.query(
            &self.info,
            "testquery",
            "Enter any data: ",
            &mut answer,
            QUERY_CAPACITY,
        ) {
            Ok(()) => bus.report_fmt(
                &self.info,
                StatusLevel::Info,
                format_args!("query input was: {answer}"),
            ),
            Err(err) => bus.report_fmt(
                &self.info,
                StatusLevel::Info,
                format_args!("no query input: {err}"),
            ),
        }
        ProvisionOutcome::Incomplete
    }

    fn resume(&self, ctx: &ProvisionContext, session: StepSession<'_>) -> ProvisionOutcome {
        let bus = ctx.bus();
        bus.report(&self.info, StatusLevel::Info, "reading from NV store");
        let step = match session.read_step() {
            Ok(step) => step,
            Err(err) => return self.fail(ctx, &err),
        };

        match step {
            1 => {
                bus.report(&self.info, StatusLevel::Info, "writing to NV store again");
                if let Err(err) = session.write_step(2) {
                    return self.fail(ctx, &err);
                }
                bus.report(
                    &self.info,
                    StatusLevel::Info,
                    "provisioning will continue after the next invocation",
                );
                ProvisionOutcome::Incomplete
            }
            2 => {
                bus.report(&self.info, StatusLevel::Info, "deleting NV store");
                match session.finish(PROVISIONED_MARKER) {
                    Ok(_) => {
                        bus.report(&self.info, StatusLevel::Info, "complete");
                        ProvisionOutcome::Complete
                    }
                    Err(err) => self.fail(ctx, &err),
                }
            }
            _ => {
                bus.report(&self.info, StatusLevel::Warn, "NV store corrupted");
                ProvisionOutcome::Error
            }
        }
    }

    fn fail(&self, ctx: &ProvisionContext, err: &ProvisionError) -> ProvisionOutcome {
        match err {
            ProvisionError::Store(store_err) => ctx.bus().report_store_error(&self.info, store_err),
            ProvisionError::Corrupted { .. } => {
                ctx.bus()
                    .report(&self.info, StatusLevel::Warn, "NV store corrupted")
            }
            other => ctx
                .bus()
                .report(&self.info, StatusLevel::Error, &other.to_string()),
        }
        ProvisionOutcome::Error
    }
}

impl Default for SelfTestModule {
    fn default() -> Self {
        Self::new()
    }
}

impl PufModule for SelfTestModule {
    fn info(&self) -> &ModuleInfo {
        &self.info
    }

    fn is_hw_supported(&self, _ctx: &ProvisionContext) -> bool {
        true
    }

    fn provision(&self, ctx: &ProvisionContext) -> ProvisionOutcome {
        match StepSession::begin(ctx, &self.info, StorageKind::TempFile, &format_step(1)) {
            Ok(SessionStart::Fresh(_)) => {
                ctx.bus()
                    .report(&self.info, StatusLevel::Info, "creating NV store");
                self.start(ctx)
            }
            Ok(SessionStart::Resumed(session)) => {
                ctx.bus().report(
                    &self.info,
                    StatusLevel::Info,
                    "NV store exists, continuing provision",
                );
                self.resume(ctx, session)
            }
            Err(err) => self.fail(ctx, &err),
        }
    }

    fn chal_resp(&self, _ctx: &ProvisionContext) -> Option<Vec<u8>> {
        None
    }
}
