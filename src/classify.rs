use crate::models::{Task, TaskStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bucket {
    Ongoing,
    Success,
    Failure,
}

impl Bucket {
    /// Display order of the board tabs.
    pub const ALL: [Bucket; 3] = [Bucket::Ongoing, Bucket::Success, Bucket::Failure];

    pub fn of(status: TaskStatus) -> Bucket {
        match status {
            TaskStatus::Ongoing => Bucket::Ongoing,
            TaskStatus::Success => Bucket::Success,
            TaskStatus::Failure => Bucket::Failure,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Ongoing => "Ongoing",
            Bucket::Success => "Completed On Time",
            Bucket::Failure => "Failed",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Bucket::Ongoing => 0,
            Bucket::Success => 1,
            Bucket::Failure => 2,
        }
    }

    pub fn next(&self) -> Bucket {
        Bucket::ALL[(self.index() + 1) % Bucket::ALL.len()]
    }

    pub fn previous(&self) -> Bucket {
        Bucket::ALL[(self.index() + Bucket::ALL.len() - 1) % Bucket::ALL.len()]
    }
}

/// Tasks grouped by lifecycle bucket. All three groups always exist.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Buckets {
    pub ongoing: Vec<Task>,
    pub success: Vec<Task>,
    pub failure: Vec<Task>,
}

impl Buckets {
    pub fn get(&self, bucket: Bucket) -> &[Task] {
        match bucket {
            Bucket::Ongoing => &self.ongoing,
            Bucket::Success => &self.success,
            Bucket::Failure => &self.failure,
        }
    }

    pub fn len(&self) -> usize {
        self.ongoing.len() + self.success.len() + self.failure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions tasks by status, preserving their order within each bucket.
pub fn classify<I>(tasks: I) -> Buckets
where
    I: IntoIterator<Item = Task>,
{
    let mut buckets = Buckets::default();
    for task in tasks {
        match Bucket::of(task.status) {
            Bucket::Ongoing => buckets.ongoing.push(task),
            Bucket::Success => buckets.success.push(task),
            Bucket::Failure => buckets.failure.push(task),
        }
    }
    buckets
}
