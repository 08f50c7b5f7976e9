#[cfg(test)]
pub mod common;


#[cfg(test)]
mod test_removal;



#[cfg(test)]
mod test_runner;
