mod analysis;
mod end_to_end;
mod feedback;
mod helpers;
mod pipeline;
mod transport;
