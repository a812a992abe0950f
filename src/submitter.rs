use crate::api::ImmichApi;
use crate::asset::{CreateStack, UpdateAsset};
use crate::error::AppError;
use crate::executor::{RequestExecutor, RetryPolicy};
use crate::ordering::OrderedStack;
use crate::progress::Progress;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub dry_run: bool,
    pub copy_metadata: bool,
    /// Retry mutations on transient errors. A lost response may then apply twice.
    pub retry_mutations: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitReport {
    pub stacks_created: usize,
    pub metadata_updates: usize,
}

/// Creates stacks and copies capture metadata, one stack at a time.
pub struct StackSubmitter {
    api: Arc<dyn ImmichApi>,
    executor: Arc<RequestExecutor>,
    progress: Arc<dyn Progress>,
    options: SubmitOptions,
}

impl StackSubmitter {
    pub fn new(
        api: Arc<dyn ImmichApi>,
        executor: Arc<RequestExecutor>,
        progress: Arc<dyn Progress>,
        options: SubmitOptions,
    ) -> Self {
        Self {
            api,
            executor,
            progress,
            options,
        }
    }

    fn mutation_policy(&self) -> RetryPolicy {
        if self.options.retry_mutations {
            self.executor.policy()
        } else {
            RetryPolicy::none()
        }
    }

    /// Submits every stack in order. The first failure stops the run; stacks
    /// already submitted stay on the server.
    pub async fn submit_all(&self, stacks: &[OrderedStack]) -> Result<SubmitReport, AppError> {
        let mut report = SubmitReport::default();
        let total = stacks.len();

        for (i, stack) in stacks.iter().enumerate() {
            self.progress.line(&format!(
                "Stack {}/{}: {}",
                i + 1,
                total,
                stack.file_names().join(", ")
            ));

            if !self.options.dry_run {
                self.create_stack(stack).await?;
                report.stacks_created += 1;
            }

            if self.options.copy_metadata {
                report.metadata_updates += self.copy_metadata(stack).await?;
            }
        }

        Ok(report)
    }

    async fn create_stack(&self, stack: &OrderedStack) -> Result<(), AppError> {
        let request = CreateStack {
            asset_ids: stack.asset_ids(),
        };
        let label = format!("POST /api/stacks ({})", stack.base_name);
        let api = self.api.clone();
        self.executor
            .execute_with(self.mutation_policy(), &label, || api.create_stack(&request))
            .await?;
        log::info!("Created stack {} with {} assets", stack.base_name, request.asset_ids.len());
        Ok(())
    }

    /// Copies the metadata source's timestamp and coordinates onto every
    /// member whose timestamp differs. Returns the number of members touched.
    async fn copy_metadata(&self, stack: &OrderedStack) -> Result<usize, AppError> {
        let Some(source) = stack.metadata_source() else {
            log::debug!("No RAW member in {}, skipping metadata copy", stack.base_name);
            return Ok(0);
        };

        let update = UpdateAsset::copied_from(source);
        let mut updated = 0;

        for member in stack
            .members()
            .iter()
            .filter(|m| m.local_date_time != source.local_date_time)
        {
            self.progress.line(&format!(
                "Copying metadata from {} to {}",
                source.original_file_name, member.original_file_name
            ));

            if !self.options.dry_run {
                let label = format!("PUT /api/assets/{}", member.id);
                let api = self.api.clone();
                self.executor
                    .execute_with(self.mutation_policy(), &label, || {
                        api.update_asset(&member.id, &update)
                    })
                    .await?;
                log::debug!("Updated capture metadata of {}", member.original_file_name);
            }
            updated += 1;
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::tests::FakeApi;
    use crate::grouping::tests::detail;
    use crate::grouping::Group;
    use crate::ordering::StackOrderer;
    use crate::progress::tests::RecordingProgress;
    use chrono::{TimeZone, Utc};

    fn stacks() -> Vec<OrderedStack> {
        let orderer = StackOrderer::new("/p", [".cr2".to_string()].into_iter().collect());

        let raw = detail("raw", "/p/IMG_1.cr2");
        let mut edit = detail("edit", "/p/IMG_1_a.jpg");
        edit.asset.local_date_time = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let same = detail("same", "/p/IMG_1.jpg");

        let jpg_only = vec![detail("x", "/p/IMG_2.jpg"), detail("y", "/p/IMG_2_a.jpg")];

        vec![
            orderer.order(Group {
                base_name: "IMG_1".into(),
                members: vec![edit, same, raw],
            }),
            orderer.order(Group {
                base_name: "IMG_2".into(),
                members: jpg_only,
            }),
        ]
    }

    fn submitter(api: Arc<FakeApi>, progress: Arc<RecordingProgress>, options: SubmitOptions) -> StackSubmitter {
        let executor = RequestExecutor::new(5, RetryPolicy::default(), progress.clone()).unwrap();
        StackSubmitter::new(api, Arc::new(executor), progress, options)
    }

    #[tokio::test]
    async fn submits_stacks_and_metadata_in_order() {
        let api = Arc::new(FakeApi::default());
        let progress = Arc::new(RecordingProgress::default());
        let options = SubmitOptions {
            dry_run: false,
            copy_metadata: true,
            retry_mutations: true,
        };

        let report = submitter(api.clone(), progress.clone(), options)
            .submit_all(&stacks())
            .await
            .unwrap();

        assert_eq!(report.stacks_created, 2);
        assert_eq!(report.metadata_updates, 1);
        assert_eq!(
            *api.mutations.lock().unwrap(),
            vec!["POST raw,same,edit", "PUT edit", "POST x,y"]
        );
        assert_eq!(
            progress.lines(),
            vec![
                "Stack 1/2: IMG_1.cr2, IMG_1.jpg, IMG_1_a.jpg",
                "Copying metadata from IMG_1.cr2 to IMG_1_a.jpg",
                "Stack 2/2: IMG_2.jpg, IMG_2_a.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn dry_run_reports_without_mutating() {
        let api = Arc::new(FakeApi::default());
        let progress = Arc::new(RecordingProgress::default());
        let options = SubmitOptions {
            dry_run: true,
            copy_metadata: true,
            retry_mutations: true,
        };

        let report = submitter(api.clone(), progress.clone(), options)
            .submit_all(&stacks())
            .await
            .unwrap();

        assert!(api.mutations.lock().unwrap().is_empty());
        assert_eq!(report.stacks_created, 0);
        assert_eq!(report.metadata_updates, 1);
        assert_eq!(progress.lines().len(), 3);
    }

    #[tokio::test]
    async fn metadata_is_left_alone_unless_enabled() {
        let api = Arc::new(FakeApi::default());
        let progress = Arc::new(RecordingProgress::default());

        submitter(api.clone(), progress, SubmitOptions::default())
            .submit_all(&stacks())
            .await
            .unwrap();

        let mutations = api.mutations.lock().unwrap();
        assert_eq!(mutations.len(), 2);
        assert!(mutations.iter().all(|m| m.starts_with("POST")));
    }
}
