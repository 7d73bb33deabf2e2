//! Tests for the phase order of a staging run.

use mockall::Sequence;

use super::common::*;
use crate::{
    error::StageError,
    release::ReleaseType,
    repo::{MockRepository, Repository},
    stage::{MockStageClient, implementation::MockStageImpl, run_stage},
};

#[test_log::test]
fn phases_run_in_order() {
    let mut seq = Sequence::new();
    let mut client = MockStageClient::new();

    client
        .expect_validate_options()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    client
        .expect_check_prerequisites()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    client
        .expect_set_build_candidate()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    client
        .expect_generate_release_version()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    client
        .expect_prepare_workspace()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    client
        .expect_tag_repository()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    client
        .expect_build()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    client
        .expect_generate_changelog()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    client
        .expect_stage_artifacts()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    client.expect_submit().never();

    run_stage(&mut client).unwrap();
}

#[test]
fn first_failure_ends_the_run() {
    let mut client = MockStageClient::new();
    client.expect_validate_options().returning(|| Ok(()));
    client.expect_check_prerequisites().returning(|| Ok(()));
    client.expect_set_build_candidate().returning(|| Ok(()));
    client.expect_generate_release_version().returning(|| Ok(()));
    client.expect_prepare_workspace().returning(|| Ok(()));
    client
        .expect_tag_repository()
        .times(1)
        .returning(|| Err(StageError::TagExists("v1.30.0-alpha.1".into())));
    client.expect_build().never();
    client.expect_generate_changelog().never();
    client.expect_stage_artifacts().never();

    let err = run_stage(&mut client).unwrap_err();
    assert_eq!(err.to_string(), "tag v1.30.0-alpha.1 already exists");
}

#[test]
fn validation_failure_runs_nothing_else() {
    let mut client = MockStageClient::new();
    client
        .expect_validate_options()
        .returning(|| Err(StageError::invalid_options("release branch is required")));
    client.expect_check_prerequisites().never();
    client.expect_set_build_candidate().never();

    assert!(run_stage(&mut client).is_err());
}

fn alpha_repo() -> MockRepository {
    let mut repo = MockRepository::new();
    repo.expect_rev_parse()
        .returning(|_| Err(git_error("not found")));
    repo.expect_checkout().returning(|_| Ok(()));
    repo.expect_current_branch().returning(|| Ok(String::new()));
    repo.expect_tag().returning(|_, _| Ok(()));
    repo
}

#[test_log::test]
fn alpha_run_end_to_end() {
    let mut mock_impl = MockStageImpl::new();
    mock_impl.expect_check_prerequisites().times(1).returning(|| Ok(()));
    mock_impl
        .expect_open_repo()
        .times(2)
        .returning(|_| Ok(Box::new(alpha_repo()) as Box<dyn Repository>));
    mock_impl
        .expect_prepare_workspace_stage()
        .times(1)
        .returning(|_, _| Ok(()));
    mock_impl
        .expect_configure_default_identity()
        .times(1)
        .returning(|_| Ok(()));
    mock_impl
        .expect_build()
        .withf(|version| version == "v1.30.0-alpha.1")
        .times(1)
        .returning(|_| Ok(()));
    mock_impl
        .expect_generate_changelog()
        .withf(|options| options.tag == "v1.30.0-alpha.1")
        .times(1)
        .returning(|_| Ok(()));
    mock_impl.expect_check_release_bucket().returning(|_| Ok(()));
    mock_impl
        .expect_stage_local_source_tree()
        .returning(|_, _, _| Ok(()));
    mock_impl.expect_stage_local_artifacts().returning(|_| Ok(()));
    mock_impl
        .expect_push_release_artifacts()
        .times(2)
        .returning(|_, _, _| Ok(()));
    mock_impl
        .expect_push_container_images()
        .times(1)
        .returning(|_| Ok(()));

    let mut options = options(ReleaseType::Alpha, "master");
    options.build_version = Some(ALPHA_BUILD_VERSION.to_string());
    let mut stage = create_test_stage(options, mock_impl, None);

    run_stage(&mut stage).unwrap();

    let state = stage.state().unwrap();
    assert!(state.parent_branch.is_empty());
    assert_eq!(state.versions().unwrap().ordered(), vec!["v1.30.0-alpha.1"]);
}
