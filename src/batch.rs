pub mod error;
pub mod catalog;

use crate::batch::error::{JobProcessFailed, JobReadFailed, JobRuntimeError, JobWriteFailed};
use std::fmt::Debug;
use tracing::{info, warn};

/// 배치잡 아이템 리더 트레이트 정해진 데이터를 파일, 데이터베이스 등 특정 위치에서 조회한다.
/// 페이징을 지원하지 않기 때문에 잡 1회당 한번만 호출 됨으로 처리에 필요한 데이터들을 모두 로드해야한다.
pub trait Reader {
    type Item;

    fn do_read(&self) -> Result<Vec<Self::Item>, JobReadFailed>;
}

/// 배치잡 데이터 변환 트레이트 `In` 타입으로 들어온 데이터를 `Out` 타입으로 변경한다.
/// 변환에 실패한 아이템은 잡을 중단시키지 않고 사유와 함께 건너뛴다.
pub trait Processor {
    type In;
    type Out;

    fn do_process(&self, item: Self::In) -> Result<Self::Out, JobProcessFailed<Self::In>>;
}

/// `Reader`, `Processor` 작업 이후 완성된 데이터들을 최종적으로 외부 저장소에 저장하는 트레이트
pub trait Writer {
    type Item;
    type Summary;

    fn do_write(&self, items: Vec<Self::Item>) -> Result<Self::Summary, JobWriteFailed>;
}

/// 값을 지연해서 제공하는 트레이트, 인자가 없는 클로저나 함수는 모두 `Provider`가 된다.
pub trait Provider {

    type Item;

    fn retrieve(&self) -> Self::Item;
}

impl<T, O> Provider for T where T: Fn() -> O {

    type Item = O;

    fn retrieve(&self) -> Self::Item {
        self()
    }
}

/// 잡 실행 결과
pub struct JobReport<I, S> {
    read_count: usize,
    skipped: Vec<JobProcessFailed<I>>,
    summary: S,
}

impl<I, S> JobReport<I, S> {
    pub fn read_count(&self) -> usize {
        self.read_count
    }

    /// 변환 단계에서 건너뛴 아이템과 그 사유
    pub fn skipped(&self) -> &[JobProcessFailed<I>] {
        &self.skipped
    }

    /// `Writer`가 반환한 저장 결과
    pub fn summary(&self) -> &S {
        &self.summary
    }

    pub fn into_summary(self) -> S {
        self.summary
    }
}

pub struct Job<I, O, S> {
    reader: Box<dyn Reader<Item = I>>,
    processor: Box<dyn Processor<In = I, Out = O>>,
    writer: Box<dyn Writer<Item = O, Summary = S>>,
}

impl<I: Debug, O, S> Job<I, O, S> {

    pub fn run(&self) -> Result<JobReport<I, S>, JobRuntimeError> {
        let items = self.reader.do_read()?;
        let read_count = items.len();

        let (accepted, skipped) = self.process_all(items);
        for failed in &skipped {
            warn!(item = ?failed.item(), reason = failed.message(), "skipped item");
        }
        info!(read = read_count, accepted = accepted.len(), skipped = skipped.len(), "processing finished");

        let summary = self.writer.do_write(accepted)?;

        Ok(JobReport { read_count, skipped, summary })
    }

    /// 모든 아이템을 변환해 (성공, 실패) 쌍으로 나눈다.
    fn process_all(&self, items: Vec<I>) -> (Vec<O>, Vec<JobProcessFailed<I>>) {
        items.into_iter()
            .fold((Vec::new(), Vec::new()), |(mut accepted, mut skipped), item| {
                match self.processor.do_process(item) {
                    Ok(out) => accepted.push(out),
                    Err(failed) => skipped.push(failed),
                }
                (accepted, skipped)
            })
    }
}

pub fn job_builder<I>() -> ReaderBuildStep<I> {
    ReaderBuildStep { _phantom: std::marker::PhantomData }
}

pub struct ReaderBuildStep<I> {
    _phantom: std::marker::PhantomData<I>,
}

impl<I> ReaderBuildStep<I> {
    pub fn reader(self, reader: Box<dyn Reader<Item = I>>) -> ProcessorBuildStep<I> {
        ProcessorBuildStep { reader }
    }
}

pub struct ProcessorBuildStep<I> {
    reader: Box<dyn Reader<Item = I>>,
}

impl<I> ProcessorBuildStep<I> {
    pub fn processor<O>(self, processor: Box<dyn Processor<In = I, Out = O>>) -> WriterBuildStep<I, O> {
        WriterBuildStep { reader: self.reader, processor }
    }
}

pub struct WriterBuildStep<I, O> {
    reader: Box<dyn Reader<Item = I>>,
    processor: Box<dyn Processor<In = I, Out = O>>,
}

impl<I, O> WriterBuildStep<I, O> {
    pub fn writer<S>(self, writer: Box<dyn Writer<Item = O, Summary = S>>) -> JobBuildStep<I, O, S> {
        JobBuildStep { reader: self.reader, processor: self.processor, writer }
    }
}

pub struct JobBuildStep<I, O, S> {
    reader: Box<dyn Reader<Item = I>>,
    processor: Box<dyn Processor<In = I, Out = O>>,
    writer: Box<dyn Writer<Item = O, Summary = S>>,
}

impl<I, O, S> JobBuildStep<I, O, S> {
    pub fn build(self) -> Job<I, O, S> {
        Job {
            reader: self.reader,
            processor: self.processor,
            writer: self.writer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecReader(Vec<&'static str>);

    impl Reader for VecReader {
        type Item = &'static str;

        fn do_read(&self) -> Result<Vec<Self::Item>, JobReadFailed> {
            Ok(self.0.clone())
        }
    }

    struct FailingReader;

    impl Reader for FailingReader {
        type Item = &'static str;

        fn do_read(&self) -> Result<Vec<Self::Item>, JobReadFailed> {
            Err(JobReadFailed::InvalidInput("no input".to_owned()))
        }
    }

    struct ParseProcessor;

    impl Processor for ParseProcessor {
        type In = &'static str;
        type Out = i32;

        fn do_process(&self, item: Self::In) -> Result<Self::Out, JobProcessFailed<Self::In>> {
            item.parse::<i32>()
                .map_err(|e| JobProcessFailed::new(item, e.to_string()))
        }
    }

    struct SumWriter;

    impl Writer for SumWriter {
        type Item = i32;
        type Summary = i32;

        fn do_write(&self, items: Vec<Self::Item>) -> Result<Self::Summary, JobWriteFailed> {
            Ok(items.into_iter().sum())
        }
    }

    #[test]
    fn run_skips_failed_items_and_writes_the_rest() {
        let job = job_builder()
            .reader(Box::new(VecReader(vec!["1", "x", "2", "", "3"])))
            .processor(Box::new(ParseProcessor))
            .writer(Box::new(SumWriter))
            .build();

        let report = job.run().unwrap();

        assert_eq!(report.read_count(), 5);
        assert_eq!(*report.summary(), 6);
        let skipped: Vec<&str> = report.skipped().iter().map(|f| *f.item()).collect();
        assert_eq!(skipped, vec!["x", ""]);
    }

    #[test]
    fn read_failure_aborts_job() {
        let job = job_builder()
            .reader(Box::new(FailingReader))
            .processor(Box::new(ParseProcessor))
            .writer(Box::new(SumWriter))
            .build();

        assert!(matches!(job.run(), Err(JobRuntimeError::ReadFailed(_))));
    }

    #[test]
    fn closures_are_providers() {
        let provider = || vec![1, 2, 3];

        assert_eq!(provider.retrieve(), vec![1, 2, 3]);
    }
}
