// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn task_id_display() {
    let id = TaskId::new("2f616d53-595c-4785-84e1-54e9d20f8054");
    assert_eq!(id.to_string(), "2f616d53-595c-4785-84e1-54e9d20f8054");
    assert_eq!(id.short(8), "2f616d53");
}

#[test]
fn start_creates_requested() {
    assert_eq!(
        transition(TaskStatus::New, TaskAction::Start),
        Transition::To(TaskStatus::Requested)
    );
}

#[test]
fn requested_admission_paths() {
    assert_eq!(
        transition(TaskStatus::Requested, TaskAction::Admit),
        Transition::To(TaskStatus::Running)
    );
    assert_eq!(
        transition(TaskStatus::Requested, TaskAction::QueueFull),
        Transition::To(TaskStatus::Queued)
    );
    assert_eq!(
        transition(TaskStatus::Queued, TaskAction::Admit),
        Transition::To(TaskStatus::Running)
    );
}

#[test]
fn stop_sequence() {
    assert_eq!(
        transition(TaskStatus::Running, TaskAction::Stop),
        Transition::To(TaskStatus::StopRequested)
    );
    assert_eq!(
        transition(TaskStatus::StopRequested, TaskAction::ScannerAck),
        Transition::To(TaskStatus::StopWaiting)
    );
    assert_eq!(
        transition(TaskStatus::StopWaiting, TaskAction::ScannerDone),
        Transition::To(TaskStatus::Stopped)
    );
}

#[test]
fn stop_before_running_goes_straight_to_stopped() {
    assert_eq!(
        transition(TaskStatus::Queued, TaskAction::Stop),
        Transition::To(TaskStatus::Stopped)
    );
    assert_eq!(
        transition(TaskStatus::Requested, TaskAction::Stop),
        Transition::To(TaskStatus::Stopped)
    );
}

#[test]
fn completion_sequence() {
    assert_eq!(
        transition(TaskStatus::Running, TaskAction::ScanComplete),
        Transition::To(TaskStatus::Processing)
    );
    assert_eq!(
        transition(TaskStatus::Processing, TaskAction::PostDone),
        Transition::To(TaskStatus::Done)
    );
}

#[test]
fn worker_error_interrupts_from_anywhere() {
    for status in [
        TaskStatus::Requested,
        TaskStatus::Queued,
        TaskStatus::Running,
        TaskStatus::Processing,
        TaskStatus::StopRequested,
        TaskStatus::StopWaiting,
    ] {
        assert_eq!(
            transition(status, TaskAction::WorkerError),
            Transition::To(TaskStatus::Interrupted),
            "from {status:?}"
        );
    }
}

#[test]
fn resume_only_from_stopped_or_interrupted() {
    assert_eq!(
        transition(TaskStatus::Stopped, TaskAction::Resume),
        Transition::To(TaskStatus::Requested)
    );
    assert_eq!(
        transition(TaskStatus::Interrupted, TaskAction::Resume),
        Transition::To(TaskStatus::Requested)
    );
    assert_eq!(
        transition(TaskStatus::Done, TaskAction::Resume),
        Transition::NotApplicable
    );
    assert_eq!(
        transition(TaskStatus::Running, TaskAction::Resume),
        Transition::NotApplicable
    );
}

#[test]
fn delete_teardown_sequence() {
    assert_eq!(
        transition(TaskStatus::Running, TaskAction::Delete),
        Transition::To(TaskStatus::DeleteRequested)
    );
    assert_eq!(
        transition(TaskStatus::DeleteRequested, TaskAction::DeleteObserved),
        Transition::To(TaskStatus::DeleteWaiting)
    );
    assert_eq!(
        transition(TaskStatus::Queued, TaskAction::DeleteUltimate),
        Transition::To(TaskStatus::DeleteUltimateRequested)
    );
    assert_eq!(
        transition(
            TaskStatus::DeleteUltimateRequested,
            TaskAction::DeleteObserved
        ),
        Transition::To(TaskStatus::DeleteUltimateWaiting)
    );
}

#[test]
fn unspecified_pairs_are_not_applicable() {
    assert_eq!(
        transition(TaskStatus::New, TaskAction::Stop),
        Transition::NotApplicable
    );
    assert_eq!(
        transition(TaskStatus::Done, TaskAction::Admit),
        Transition::NotApplicable
    );
    assert_eq!(
        transition(TaskStatus::New, TaskAction::ScannerDone),
        Transition::NotApplicable
    );
}

#[test]
fn start_predicate_matches_quiescent_states() {
    assert!(can_start(TaskStatus::New));
    assert!(can_start(TaskStatus::Done));
    assert!(can_start(TaskStatus::Stopped));
    assert!(can_start(TaskStatus::Interrupted));
    assert!(!can_start(TaskStatus::Running));
    assert!(!can_start(TaskStatus::Queued));
}

#[test]
fn move_requires_quiescence() {
    assert!(can_move(TaskStatus::New));
    assert!(can_move(TaskStatus::Done));
    assert!(can_move(TaskStatus::Stopped));
    assert!(!can_move(TaskStatus::Interrupted));
    assert!(!can_move(TaskStatus::Running));
}

#[test]
fn run_status_rank_is_monotonic_along_happy_path() {
    let path = [
        TaskStatus::Requested,
        TaskStatus::Queued,
        TaskStatus::Running,
        TaskStatus::Processing,
        TaskStatus::Done,
    ];
    for pair in path.windows(2) {
        assert!(pair[0].rank() <= pair[1].rank(), "{:?}", pair);
    }
    // No going back from a terminal status.
    assert!(TaskStatus::Done.rank() > TaskStatus::Running.rank());
    assert!(TaskStatus::Stopped.rank() > TaskStatus::StopWaiting.rank());
}

#[test]
fn radio_preference_takes_first_field() {
    let mut task = Task::new("t1", "radio", "user-1");
    task.preferences
        .insert("format".to_string(), "pdf;txt;xml".to_string());
    task.preferences.insert("empty".to_string(), ";a;b".to_string());
    assert_eq!(task.radio_preference("format"), Some("pdf"));
    // An empty chosen field is kept verbatim.
    assert_eq!(task.radio_preference("empty"), Some(""));
    assert_eq!(task.radio_preference("missing"), None);
}

#[test]
fn status_display_names() {
    assert_eq!(TaskStatus::StopRequested.to_string(), "Stop Requested");
    assert_eq!(
        TaskStatus::DeleteUltimateRequested.to_string(),
        "Ultimate Delete Requested"
    );
    assert_eq!(TaskStatus::Done.to_string(), "Done");
}

#[test]
fn active_and_terminal_are_disjoint() {
    let all = [
        TaskStatus::New,
        TaskStatus::Requested,
        TaskStatus::Queued,
        TaskStatus::Running,
        TaskStatus::Processing,
        TaskStatus::StopRequested,
        TaskStatus::StopWaiting,
        TaskStatus::Stopped,
        TaskStatus::DeleteRequested,
        TaskStatus::DeleteUltimateRequested,
        TaskStatus::DeleteWaiting,
        TaskStatus::DeleteUltimateWaiting,
        TaskStatus::Done,
        TaskStatus::Interrupted,
    ];
    for status in all {
        assert!(
            !(status.is_active() && status.is_terminal()),
            "{status:?} both active and terminal"
        );
    }
}
