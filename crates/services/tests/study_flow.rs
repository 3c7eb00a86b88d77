use chrono::{Duration, FixedOffset};
use services::{AppServices, Clock, SessionStart};
use storage::repository::Storage;
use study_core::model::{
    AttemptSubmission, Difficulty, Level, QuizDraft, QuizQuestion, SubjectDraft, TopicDraft,
    TopicProgressPatch, UserId,
};
use study_core::time::fixed_now;

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

async fn sqlite_services(name: &str, clock: Clock) -> AppServices {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let storage = Storage::sqlite(&url).await.expect("sqlite storage");
    AppServices::from_storage(&storage, clock, utc(), None)
}

fn subject_draft(total: u32) -> SubjectDraft {
    SubjectDraft {
        name: "Statistics".into(),
        description: Some("Intro course".into()),
        difficulty: Difficulty::Medium,
        exam_date: Some(fixed_now() + Duration::days(14)),
        total_topics: total,
        priority: Level::High,
    }
}

fn topic_draft(name: &str) -> TopicDraft {
    TopicDraft {
        name: name.into(),
        description: None,
        difficulty: Difficulty::Medium,
        estimated_hours: 1.5,
    }
}

#[tokio::test]
async fn topic_progress_keeps_subject_count_in_sync() {
    let app = sqlite_services("memdb_flow_progress", Clock::fixed(fixed_now())).await;
    let me = UserId::new("student-1").unwrap();

    let subject = app.subjects().create(&me, subject_draft(10)).await.unwrap();
    let mut topic_ids = Vec::new();
    for name in ["Mean", "Variance", "Regression"] {
        let topic = app.topics().create(&me, subject.id, topic_draft(name)).await.unwrap();
        topic_ids.push(topic.id);
    }

    for id in &topic_ids[..2] {
        app.topics()
            .update_progress(
                &me,
                *id,
                TopicProgressPatch {
                    completed: Some(true),
                    mastery_level: Some(80.0),
                },
            )
            .await
            .unwrap();
    }

    let listed = app.subjects().list(&me).await.unwrap();
    assert_eq!(listed[0].completed_topics, 2);
    assert!((listed[0].progress_percentage() - 20.0).abs() < 1e-9);

    let progress = app.subjects().progress(&me, subject.id).await.unwrap().unwrap();
    assert_eq!(progress.total_topics, 3);
    assert_eq!(progress.completed_topics, 2);
    assert!((progress.average_mastery - 160.0 / 3.0).abs() < 1e-9);

    app.topics().delete(&me, topic_ids[0]).await.unwrap();
    let listed = app.subjects().list(&me).await.unwrap();
    assert_eq!(listed[0].completed_topics, 1);

    app.subjects().delete(&me, subject.id).await.unwrap();
    assert!(app.topics().list_by_subject(&me, subject.id).await.unwrap().is_empty());
    assert!(app.subjects().progress(&me, subject.id).await.unwrap().is_none());
}

#[tokio::test]
async fn finished_sessions_show_up_in_analytics() {
    let url = "sqlite:file:memdb_flow_sessions?mode=memory&cache=shared";
    let storage = Storage::sqlite(url).await.expect("sqlite storage");
    let me = UserId::new("student-2").unwrap();

    let at_start = AppServices::from_storage(&storage, Clock::fixed(fixed_now()), utc(), None);
    let session = at_start
        .sessions()
        .start(&me, SessionStart::default())
        .await
        .unwrap();
    assert_eq!(
        at_start.sessions().active(&me).await.unwrap().map(|s| s.id),
        Some(session.id)
    );

    let later = AppServices::from_storage(
        &storage,
        Clock::fixed(fixed_now() + Duration::minutes(40)),
        utc(),
        None,
    );
    let ended = later.sessions().end(&me, session.id, None).await.unwrap();
    assert_eq!(ended.duration, 40);

    let stats = later.analytics().study_analytics(&me, None, None).await.unwrap();
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.total_study_time, 40);
    assert_eq!(stats.daily_stats[0].date, "Tue Nov 14 2023");
}

#[tokio::test]
async fn saved_quiz_grades_attempts() {
    let app = sqlite_services("memdb_flow_quiz", Clock::fixed(fixed_now())).await;
    let me = UserId::new("student-3").unwrap();
    let subject = app.subjects().create(&me, subject_draft(4)).await.unwrap();

    let question = QuizQuestion {
        question: "Which measure is robust to outliers?".into(),
        options: vec!["mean".into(), "median".into(), "range".into(), "variance".into()],
        correct_answer: 1,
        explanation: "The median ignores extreme values.".into(),
    };
    let quiz = app
        .quizzes()
        .save(
            &me,
            subject.id,
            QuizDraft {
                title: "Robust statistics".into(),
                topic_id: None,
                difficulty: Difficulty::Medium,
                questions: vec![question.clone(), question],
            },
        )
        .await
        .unwrap();

    let attempt = app
        .quizzes()
        .submit_attempt(
            &me,
            quiz.id,
            AttemptSubmission {
                answers: vec![Some(1), Some(3)],
                time_spent: 75,
            },
        )
        .await
        .unwrap();
    assert_eq!(attempt.score, 50);

    let attempts = app.quizzes().list_attempts(&me, quiz.id).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].id, attempt.id);
}
