/// 进度事件 - 每完成一个工作单元产生一条，由调用方即时消费
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub value: usize,
    pub max: usize,
    pub description: &'static str,
}

impl Progress {
    pub fn new(value: usize, max: usize, description: &'static str) -> Self {
        // value 不越过 max，阶段内单调不减由产生方保证
        Self {
            value: value.min(max),
            max,
            description,
        }
    }
}
