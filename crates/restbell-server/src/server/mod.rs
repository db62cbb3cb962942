//! gRPC server implementations for the Restbell notification service.

pub mod device_svc;
pub mod interceptor;
pub mod timer_svc;

pub use device_svc::DeviceServiceImpl;
pub use interceptor::jwt_interceptor;
pub use timer_svc::RestTimerServiceImpl;
