pub mod subscription;

pub use subscription::{
    parse_calendar_date, BillingCycle, CreateSubscriptionDto, Subscription, SubscriptionStatus,
    UpdateSubscriptionDto,
};
