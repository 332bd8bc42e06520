//! 파이프라인 도메인 모델.
//!
//! 추출 → 변환 → 적재 단계 사이에서 오가는 타입들을 정의합니다.
//! 모든 엔티티는 한 번의 실행 동안만 존재하며, 영속 데이터는 저장소가 소유합니다.

pub mod interval;
pub mod price_table;
pub mod proxy;
pub mod records;
pub mod wide_table;

pub use interval::{partition, DateInterval, DEFAULT_WINDOW_DAYS};
pub use price_table::{RawPriceRow, RawPriceTable};
pub use proxy::ProxyEndpoint;
pub use records::{StockRecord, TrendRecord};
pub use wide_table::{WideTrendRow, WideTrendTable, PARTIAL_COLUMN};
