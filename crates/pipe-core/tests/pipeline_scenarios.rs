use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pipe_core::{pipeline, pipeline_with_context, BoxError, PipelineError, Stage, StepResult};

#[derive(Clone)]
struct Base {
    base: i32,
}

#[tokio::test]
async fn sequential_steps_compose() {
    let p = pipeline().step(|v: i32, _| Ok(v * 2)).step(|v, _| Ok(v + 1));
    assert_eq!(p.run(5).await.ok(), Some(11));
}

#[tokio::test]
async fn failing_step_short_circuits() {
    let second_ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&second_ran);

    let p = pipeline().step(|_: i32, _| Err::<i32, _>("boom".into()))
                      .step(move |v, _| {
                          flag.store(true, Ordering::SeqCst);
                          Ok(v + 1)
                      });

    let err = p.run(5).await.expect_err("first step fails");
    assert_eq!(err.to_string(), "boom");
    assert!(matches!(err, PipelineError::Step(_)));
    assert!(!second_ran.load(Ordering::SeqCst), "no step after the failure may run");
}

#[tokio::test]
async fn initial_context_is_visible_to_steps() {
    let p = pipeline_with_context(Base { base: 10 }).step(|v: i32, ctx| Ok(v + ctx.base));
    assert_eq!(p.run(5).await.ok(), Some(15));
}

#[tokio::test]
async fn assertion_with_custom_message() {
    let p = pipeline().step(|v: i32, _| Ok(v)).assert(|v, _| *v > 0, "must be positive");
    let err = p.run(-1).await.expect_err("negative input must fail");
    assert_eq!(err.to_string(), "must be positive");
    assert!(err.is_assertion());
}

#[tokio::test]
async fn assertion_default_message_and_pass_through() {
    let p = pipeline().assert_default(|v: &i32, _| *v > 0);
    let err = p.run(0).await.expect_err("zero is not positive");
    assert_eq!(err.to_string(), "Assertion failed");
    assert_eq!(p.run(1).await.ok(), Some(1));
}

#[tokio::test]
async fn context_steps_thread_into_later_steps() {
    let p = pipeline_with_context(Base { base: 2 }).context(|ctx, v: &i32| ctx.base * *v)
                                                    .step(|v, factor: &i32| Ok(format!("{v}x{factor}")));
    assert_eq!(p.run(3).await.ok().as_deref(), Some("3x6"));
}

#[tokio::test]
async fn async_functions_are_awaited_in_order() {
    let p = pipeline().step_async(|v: i32, _| async move {
                          tokio::task::yield_now().await;
                          Ok::<_, BoxError>(v * 10)
                      })
                      .context_async(|_, v: &i32| {
                          let snapshot = *v;
                          async move { snapshot + 1 }
                      })
                      .assert_async(|v: &i32, ctx: &i32| {
                                        let ok = *v + 1 == *ctx;
                                        async move { ok }
                                    },
                                    "context must follow value")
                      .step(|v, ctx| Ok(v + ctx));
    assert_eq!(p.run(4).await.ok(), Some(81));
}

#[tokio::test]
async fn value_type_can_change_between_steps() {
    let p = pipeline().step(|raw: &'static str, _| raw.parse::<u32>().map_err(BoxError::from))
                      .step(|n, _| Ok(vec![n; 2]));
    assert_eq!(p.run("7").await.ok(), Some(vec![7, 7]));

    let err = p.run("x").await.expect_err("not a number");
    assert_eq!(err.to_string(), "invalid digit found in string");
}

#[tokio::test]
async fn panicking_step_becomes_failure() {
    let p = pipeline().step(|v: i32, _| -> StepResult<i32> {
                          if v == 0 {
                              panic!("division by zero");
                          }
                          Ok(100 / v)
                      });
    let err = p.run(0).await.expect_err("panic is reported as failure");
    assert!(err.is_panic());
    assert_eq!(err.to_string(), "division by zero");
    assert_eq!(p.run(4).await.ok(), Some(25));
}

struct Greeting {
    prefix: String,
}

#[async_trait]
impl Stage<String, Base> for Greeting {
    type Output = String;

    fn name(&self) -> &str {
        "greeting"
    }

    async fn run(&self, value: String, context: &Base) -> StepResult<String> {
        Ok(format!("{} {value} #{}", self.prefix, context.base))
    }
}

#[tokio::test]
async fn stages_plug_in_like_steps() {
    let p = pipeline_with_context::<String, _>(Base { base: 1 }).stage(Greeting { prefix: "hola".into() })
                                                                .step(|s, _| Ok(s.len()));
    assert_eq!(p.run("mundo".to_string()).await.ok(), Some("hola mundo #1".len()));
}

#[tokio::test]
async fn seeded_input_runs_without_argument() {
    let p = pipeline().step(|v: i32, _| Ok(v + 1));
    assert!(matches!(p.run_seeded().await, Err(PipelineError::MissingInput)));

    let seeded = p.with_input(41);
    assert_eq!(seeded.run_seeded().await.ok(), Some(42));
    assert_eq!(seeded.step(|v, _| Ok(v * 2)).run_seeded().await.ok(), Some(84));
}

#[tokio::test]
async fn use_result_returns_handler_output() {
    let p = pipeline().step(|v: i32, _| Ok(v * 2));
    let label = p.use_result(5, |result| async move {
                     match result {
                         Ok(v) => format!("ok:{v}"),
                         Err(e) => format!("err:{e}"),
                     }
                 })
                 .await;
    assert_eq!(label, "ok:10");
}

#[tokio::test]
async fn use_value_skips_handler_on_failure() {
    let p = pipeline_with_context(Base { base: 3 }).assert(|v: &i32, _| *v > 0, "must be positive")
                                                    .context(|ctx, v| ctx.base + *v);

    let total = p.use_value(4, |v, ctx| async move { v + ctx }).await;
    assert_eq!(total.ok(), Some(11));

    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);
    let err = p.use_value(-4, move |v, ctx| async move {
                   flag.store(true, Ordering::SeqCst);
                   v + ctx
               })
               .await
               .expect_err("assertion fails");
    assert_eq!(err.to_string(), "must be positive");
    assert!(!called.load(Ordering::SeqCst));
}
