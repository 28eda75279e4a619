pub mod translation_worker_pool;
